use thiserror::Error;

/// Application-wide error type. Every variant carries a human-readable
/// message; `kind()` is the stable machine-checkable code callers branch on.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Terminal state: {0}")]
    TerminalState(String),

    #[error("Index out of range: {0}")]
    IndexOutOfRange(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "persistence_error",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation_error",
            AppError::InsufficientStock(_) => "insufficient_stock",
            AppError::InvalidTransition(_) => "invalid_transition",
            AppError::TerminalState(_) => "terminal_state",
            AppError::IndexOutOfRange(_) => "index_out_of_range",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.to_string()
    }
}
