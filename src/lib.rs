pub mod audit;
pub mod auth;
pub mod commands;
pub mod config;
pub mod database;
pub mod errors;
pub mod logger;
pub mod models;
pub mod pricing;
pub mod rate_limiter;
pub mod validation;

use std::path::Path;
use std::sync::Mutex;

use auth::session::SessionStore;
use errors::AppError;

/// Global application state shared by every command.
pub struct AppState {
    pub db: sqlx::SqlitePool,
    pub sessions: Mutex<SessionStore>,
}

impl AppState {
    /// Bootstrap: resolve configuration, bring up the logger, open the
    /// database pool, and run migrations.
    pub async fn init(data_dir: &Path) -> Result<Self, AppError> {
        let app_config = config::get_config();

        if let Err(e) = logger::init_global_logger(data_dir) {
            eprintln!("Warning: failed to initialize logger: {}", e);
        }

        crate::log_info!(
            "APP",
            "Application starting",
            serde_json::json!({
                "version": app_config.version,
                "environment": app_config.environment.as_str(),
            })
        );

        let pool = database::connection::init_db(data_dir).await?;

        crate::log_info!(
            "DATABASE",
            "Connection pool initialized",
            serde_json::json!({ "pool_size": pool.size() })
        );

        Ok(Self {
            db: pool,
            sessions: Mutex::new(SessionStore::new()),
        })
    }
}
