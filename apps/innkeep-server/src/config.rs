//! Server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;

/// Development-only signing secret. Set `INNKEEP_JWT_SECRET` in production.
const DEV_JWT_SECRET: &str = "innkeep-dev-secret-change-in-production";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub bind_addr: String,

    /// HTTP port
    pub http_port: u16,

    /// SQLite database file
    pub db_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// HS256 secret for bearer tokens
    pub jwt_secret: String,

    /// Token lifetime in seconds
    pub jwt_lifetime_secs: i64,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = ServerConfig {
            bind_addr: lookup("INNKEEP_BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),

            http_port: parse(&lookup, "INNKEEP_HTTP_PORT", 8080)?,

            db_path: lookup("INNKEEP_DB_PATH").unwrap_or_else(|| "./innkeep.db".to_string()),

            db_max_connections: parse(&lookup, "INNKEEP_DB_MAX_CONNECTIONS", 5)?,

            jwt_secret: lookup("INNKEEP_JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),

            // 12 hours, one long shift
            jwt_lifetime_secs: parse(&lookup, "INNKEEP_JWT_LIFETIME_SECS", 43_200)?,
        };

        if config.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("INNKEEP_JWT_SECRET".to_string()));
        }
        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("INNKEEP_DB_MAX_CONNECTIONS".to_string()));
        }
        if config.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("INNKEEP_JWT_LIFETIME_SECS".to_string()));
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.http_port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("INNKEEP_BIND_ADDR".to_string()))
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
