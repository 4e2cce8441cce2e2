use super::session::SessionData;
use crate::errors::AppError;
use crate::AppState;

/// Helper: validate a session from AppState and return a SessionData clone.
pub fn validate_session(state: &AppState, token: &str) -> Result<SessionData, AppError> {
    let store = state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    store.validate(token).cloned()
}

/// Helper: validate session + require the admin role.
pub fn validate_admin(state: &AppState, token: &str) -> Result<SessionData, AppError> {
    let store = state
        .sessions
        .lock()
        .map_err(|e| AppError::Internal(e.to_string()))?;
    store.validate_admin(token).cloned()
}
