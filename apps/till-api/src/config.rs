//! Till API configuration module.
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! `till.toml` next to the binary, then `TILL_*` environment variables.
//!
//! ```text
//!   defaults  ──►  till.toml (optional)  ──►  TILL_PORT=8080 …
//!                                                     │
//!                                                     ▼
//!                                               ApiConfig::validate()
//! ```

use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use till_db::{CheckoutConfig, DbConfig};

const DEV_JWT_SECRET: &str = "till-dev-secret-change-in-production";

/// Till API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// How long a writer waits for the SQLite lock, in milliseconds
    pub db_busy_timeout_ms: u64,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Token lifetime in hours
    pub jwt_ttl_hours: i64,

    /// Bootstrap admin account, created on first start
    pub admin_email: String,
    pub admin_password: String,
    pub admin_name: String,

    pub max_conflict_retries: u32,
    pub max_receipt_retries: u32,
    pub retry_backoff_ms: u64,
}

impl ApiConfig {
    /// Loads configuration from `till.toml` (optional) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("till")
    }

    /// Same as [`ApiConfig::load`] with an explicit config file stem.
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 5000)?
            .set_default("database_path", "till.db")?
            .set_default("db_max_connections", 5)?
            .set_default("db_busy_timeout_ms", 5000)?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_ttl_hours", 24)?
            .set_default("admin_email", "admin@supermarket.com")?
            .set_default("admin_password", "admin123")?
            .set_default("admin_name", "System Admin")?
            .set_default("max_conflict_retries", 3)?
            .set_default("max_receipt_retries", 5)?
            .set_default("retry_backoff_ms", 25)?
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("TILL"))
            .build()?;

        let config: ApiConfig = config.try_deserialize()?;
        config.validate()?;

        if config.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("Using the development JWT secret; set TILL_JWT_SECRET in production");
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue("jwt_ttl_hours".to_string()));
        }
        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::MissingRequired("database_path".to_string()));
        }
        Ok(())
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .busy_timeout(Duration::from_millis(self.db_busy_timeout_ms))
    }

    pub fn checkout_config(&self) -> CheckoutConfig {
        CheckoutConfig {
            max_conflict_retries: self.max_conflict_retries,
            max_receipt_retries: self.max_receipt_retries,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.admin_email, "admin@supermarket.com");
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.checkout_config().max_receipt_retries, 5);
        assert_eq!(
            config.checkout_config().retry_backoff,
            Duration::from_millis(25)
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ApiConfig::load_from("does-not-exist").unwrap();
        config.jwt_ttl_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.jwt_ttl_hours = 1;
        config.jwt_secret = "  ".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::MissingRequired(_))));
    }
}
