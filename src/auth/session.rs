use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::AppError;
use crate::models::user::Role;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub login_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: HashMap<String, SessionData>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Create a session and return its token (UUID v4).
    pub fn create(&mut self, user_id: String, name: String, email: String, role: Role) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        let ttl = Duration::hours(crate::config::get_config().session.ttl_hours);
        self.sessions.insert(
            token.clone(),
            SessionData {
                user_id,
                name,
                email,
                role,
                login_at: now,
                expires_at: now + ttl,
            },
        );
        token
    }

    /// Validate a session token — must exist and not be expired.
    pub fn validate(&self, token: &str) -> Result<&SessionData, AppError> {
        match self.sessions.get(token) {
            None => Err(AppError::Unauthorized("Invalid session, please log in".into())),
            Some(s) if Utc::now() > s.expires_at => {
                Err(AppError::Unauthorized("Session expired, please log in again".into()))
            }
            Some(s) => Ok(s),
        }
    }

    /// Validate a session token and require the admin role.
    pub fn validate_admin(&self, token: &str) -> Result<&SessionData, AppError> {
        let s = self.validate(token)?;
        if !s.role.is_admin() {
            return Err(AppError::Forbidden("Admin role required".into()));
        }
        Ok(s)
    }

    /// Remove a session (logout).
    pub fn destroy(&mut self, token: &str) {
        self.sessions.remove(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_validate_destroy() {
        let mut store = SessionStore::new();
        let token = store.create(
            "u1".into(),
            "Asha".into(),
            "asha@example.com".into(),
            Role::Customer,
        );

        let session = store.validate(&token).unwrap();
        assert_eq!(session.user_id, "u1");
        assert_eq!(session.role, Role::Customer);

        assert!(store.validate_admin(&token).is_err());
        assert!(store.validate("no-such-token").is_err());

        store.destroy(&token);
        assert!(store.validate(&token).is_err());
    }

    #[test]
    fn admin_guard_accepts_admin() {
        let mut store = SessionStore::new();
        let token = store.create(
            "u2".into(),
            "Ravi".into(),
            "ravi@example.com".into(),
            Role::Admin,
        );
        assert!(store.validate_admin(&token).is_ok());
    }
}
