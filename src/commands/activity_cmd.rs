use crate::errors::AppError;
use crate::models::activity::ActivityLogWithUser;
use crate::AppState;

/// Recent activity entries, newest first (Admin only).
pub async fn get_activity_logs(
    state: &AppState,
    session_token: &str,
    limit: i64,
) -> Result<Vec<ActivityLogWithUser>, AppError> {
    crate::auth::guard::validate_admin(state, session_token)?;

    let logs = sqlx::query_as::<_, ActivityLogWithUser>(
        "SELECT al.*, u.name as user_name
         FROM activity_logs al
         LEFT JOIN users u ON al.user_id = u.id
         ORDER BY al.created_at DESC, al.id DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(&state.db)
    .await?;

    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::test_util::{login_as, test_state};

    #[tokio::test]
    async fn logs_are_recorded_and_admin_scoped() {
        let state = test_state().await;
        let (user_id, customer) = login_as(&state, Role::Customer).await;
        let (_, admin) = login_as(&state, Role::Admin).await;

        crate::audit::log_activity(&state.db, Some(&user_id), "TEST", "something happened", None)
            .await;

        let logs = get_activity_logs(&state, &admin, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "TEST");
        assert_eq!(logs[0].user_name.as_deref(), Some("Test User"));

        let err = get_activity_logs(&state, &customer, 10).await.unwrap_err();
        assert_eq!(err.kind(), "forbidden");
    }
}
