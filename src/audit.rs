use sqlx::SqlitePool;

/// Record an activity entry. Best-effort: a failed audit insert never fails
/// the operation that triggered it.
pub async fn log_activity(
    db: &SqlitePool,
    user_id: Option<&str>,
    action: &str,
    description: &str,
    metadata: Option<&serde_json::Value>,
) {
    let metadata_str = metadata.map(|m| m.to_string());

    let _ = sqlx::query(
        "INSERT INTO activity_logs (user_id, action, description, metadata) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(action)
    .bind(description)
    .bind(metadata_str.as_deref())
    .execute(db)
    .await;
}
