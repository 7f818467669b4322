//! Server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.
//!
//! | Variable                    | Default         |
//! |-----------------------------|-----------------|
//! | `STOCKROOM_HOST`            | `127.0.0.1`     |
//! | `STOCKROOM_PORT`            | `8080`          |
//! | `STOCKROOM_DATABASE`        | `stockroom.db`  |
//! | `STOCKROOM_MAX_CONNECTIONS` | `5`             |
//! | `STOCKROOM_DEFAULT_STORE`   | unset           |
//! | `STOCKROOM_CORS_ORIGINS`    | localhost only  |

use std::env;
use std::net::SocketAddr;

use stockroom_db::DbConfig;

/// API server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Interface to bind
    pub host: String,

    /// Port to bind
    pub port: u16,

    /// SQLite database file, or `:memory:`
    pub database_path: String,

    /// Pool size
    pub max_connections: u32,

    /// Store used when a request names none (single-store deployments).
    /// Unset means every report request must name a store or `allStores`.
    pub default_store: Option<String>,

    /// Comma-separated allowed origins, `*` for any. Unset means localhost.
    pub cors_origins: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: "stockroom.db".to_string(),
            max_connections: 5,
            default_store: None,
            cors_origins: None,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let config = ApiConfig {
            host: non_empty("STOCKROOM_HOST").unwrap_or(defaults.host),

            port: match non_empty("STOCKROOM_PORT") {
                Some(v) => v
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("STOCKROOM_PORT".to_string()))?,
                None => defaults.port,
            },

            database_path: non_empty("STOCKROOM_DATABASE").unwrap_or(defaults.database_path),

            max_connections: match non_empty("STOCKROOM_MAX_CONNECTIONS") {
                Some(v) => v
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("STOCKROOM_MAX_CONNECTIONS".to_string()))?,
                None => defaults.max_connections,
            },

            default_store: non_empty("STOCKROOM_DEFAULT_STORE"),

            cors_origins: non_empty("STOCKROOM_CORS_ORIGINS"),
        };

        if config.max_connections == 0 {
            return Err(ConfigError::InvalidValue("STOCKROOM_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("STOCKROOM_HOST".to_string()))
    }

    /// Pool settings for the configured database.
    pub fn db_config(&self) -> DbConfig {
        if self.database_path == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path).max_connections(self.max_connections)
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
