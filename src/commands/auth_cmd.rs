use crate::errors::AppError;
use crate::models::user::{DbUser, LoginResult, PublicUser, RegisterPayload, Role};
use crate::validation;
use crate::AppState;

/// Register an account and open a session for it.
pub async fn register(state: &AppState, payload: RegisterPayload) -> Result<LoginResult, AppError> {
    validation::validate_name(&payload.name)?;
    validation::validate_email(&payload.email)?;
    validation::validate_password(&payload.password)?;

    let email = payload.email.trim().to_lowercase();

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("Email already registered".into()));
    }

    let hashed = bcrypt::hash(&payload.password, 12)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    // Only an explicit "admin" flag elevates; everything else is a customer.
    let role = if payload.role.as_deref() == Some("admin") {
        Role::Admin
    } else {
        Role::Customer
    };

    let user_id = uuid::Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO users (id, name, email, password_hash, role) VALUES (?, ?, ?, ?, ?)")
        .bind(&user_id)
        .bind(payload.name.trim())
        .bind(&email)
        .bind(&hashed)
        .bind(role.as_str())
        .execute(&state.db)
        .await?;

    crate::audit::log_activity(
        &state.db,
        Some(&user_id),
        "REGISTER",
        &format!("Account registered for {}", email),
        None,
    )
    .await;

    open_session(state, user_id, payload.name.trim().to_string(), email, role)
}

/// Log in and open a session.
pub async fn login(state: &AppState, email: &str, password: &str) -> Result<LoginResult, AppError> {
    let email = email.trim().to_lowercase();
    crate::rate_limiter::LOGIN_LIMIT.check(&email)?;

    let user: Option<DbUser> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    // Same message for unknown email and bad password
    let user = user.ok_or_else(|| AppError::Unauthorized("Invalid email or password".into()))?;

    let valid = bcrypt::verify(password, &user.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
    if !valid {
        return Err(AppError::Unauthorized("Invalid email or password".into()));
    }

    let role = Role::parse(&user.role)?;

    crate::audit::log_activity(
        &state.db,
        Some(&user.id),
        "LOGIN",
        &format!("User {} logged in", user.email),
        None,
    )
    .await;

    open_session(state, user.id, user.name, user.email, role)
}

/// Log out — destroy the session.
pub async fn logout(state: &AppState, session_token: &str) -> Result<(), AppError> {
    let user_id = crate::auth::guard::validate_session(state, session_token)
        .ok()
        .map(|s| s.user_id);

    state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?
        .destroy(session_token);

    if let Some(id) = user_id {
        crate::audit::log_activity(&state.db, Some(&id), "LOGOUT", "User logged out", None).await;
    }

    Ok(())
}

/// Resolve a session token back into the acting user.
pub async fn check_session(state: &AppState, session_token: &str) -> Result<PublicUser, AppError> {
    let session = crate::auth::guard::validate_session(state, session_token)?;
    Ok(PublicUser {
        id: session.user_id,
        name: session.name,
        email: session.email,
        role: session.role,
    })
}

fn open_session(
    state: &AppState,
    user_id: String,
    name: String,
    email: String,
    role: Role,
) -> Result<LoginResult, AppError> {
    let token = state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?
        .create(user_id.clone(), name.clone(), email.clone(), role);

    crate::log_info!(
        "AUTH",
        "Session opened",
        serde_json::json!({ "userId": user_id, "role": role.as_str() })
    );

    Ok(LoginResult {
        user: PublicUser {
            id: user_id,
            name,
            email,
            role,
        },
        session_token: token,
        login_at: chrono::Utc::now().to_rfc3339(),
    })
}
