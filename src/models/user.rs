use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Actor role. Staff operations (status transitions, assignments,
/// analytics) require Admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        match s {
            "customer" => Ok(Role::Customer),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::Internal(format!("unknown role '{}'", other))),
        }
    }

    pub fn is_admin(&self) -> bool {
        *self == Role::Admin
    }
}

/// Database row — for query_as.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DbUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub phone: Option<String>,
    pub created_at: Option<String>,
}

/// User shape sent to clients (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl TryFrom<DbUser> for PublicUser {
    type Error = AppError;

    fn try_from(u: DbUser) -> Result<Self, AppError> {
        Ok(Self {
            role: Role::parse(&u.role)?,
            id: u.id,
            name: u.name,
            email: u.email,
        })
    }
}

/// Payload for account registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Only "admin" is honored; anything else becomes customer.
    pub role: Option<String>,
}

/// Successful login/registration result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user: PublicUser,
    pub session_token: String,
    pub login_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trip() {
        assert_eq!(Role::parse("admin").unwrap(), Role::Admin);
        assert_eq!(Role::parse("customer").unwrap(), Role::Customer);
        assert!(Role::parse("staff").is_err());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Customer.is_admin());
    }
}
