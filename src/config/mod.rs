//! Runtime configuration
//!
//! Loads and validates the optional TOML configuration file. Every section
//! has defaults, so the binary also runs without a file.
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind-address = "127.0.0.1:3000"
//!
//! [database]
//! path = "./discprice.db"
//!
//! [http]
//! user-agent = "discprice/1.0"
//! request-timeout-secs = 30
//! ```

use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP trigger server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the trigger endpoint listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_database_path() -> String {
    "./discprice.db".to_string()
}

fn default_user_agent() -> String {
    format!("discprice/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Loads configuration from a TOML file
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> ConfigResult<()> {
    if config.server.bind_address.is_empty() {
        return Err(ConfigError::Validation(
            "server.bind-address must not be empty".to_string(),
        ));
    }
    if config.database.path.is_empty() {
        return Err(ConfigError::Validation(
            "database.path must not be empty".to_string(),
        ));
    }
    if config.http.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "http.request-timeout-secs must be positive".to_string(),
        ));
    }
    Ok(())
}
