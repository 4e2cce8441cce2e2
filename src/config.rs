//! Environment-based configuration module
//!
//! Configuration is resolved once at first access, in priority order:
//! 1. Environment variables
//! 2. Default values

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::OnceLock;

/// Application environment mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Get environment from APP_ENV variable or default to Development
    pub fn from_env() -> Self {
        match env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()).as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub app_name: String,
    pub version: String,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub inventory: InventoryConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file name, relative to the data directory
    pub path: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Hours before an issued session token expires
    pub ttl_hours: i64,
}

/// Inventory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Stock level at or below which a product counts as low-stock
    pub low_stock_threshold: i64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub log_to_file: bool,
    pub log_to_stdout: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = Environment::from_env();

        Self {
            environment,
            app_name: "greenroof".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "greenroof.db"),
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 5),
                min_connections: env_parse("DATABASE_MIN_CONNECTIONS", 1),
                connect_timeout_secs: env_parse("DATABASE_CONNECT_TIMEOUT_SECS", 30),
                idle_timeout_secs: env_parse("DATABASE_IDLE_TIMEOUT_SECS", 600),
            },
            session: SessionConfig {
                ttl_hours: env_parse("SESSION_TTL_HOURS", 168),
            },
            inventory: InventoryConfig {
                low_stock_threshold: env_parse("LOW_STOCK_THRESHOLD", 10),
            },
            logging: LoggingConfig {
                log_to_file: environment.is_production(),
                log_to_stdout: true,
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global configuration, resolving it on first access.
pub fn get_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::from_env();
        assert!(config.database.max_connections >= config.database.min_connections);
        assert!(config.session.ttl_hours > 0);
        assert_eq!(config.inventory.low_stock_threshold, 10);
    }
}
