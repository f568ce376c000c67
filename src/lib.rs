//! Discprice: a multi-store disc golf price crawler
//!
//! This crate discovers product pages through each store's sitemap, extracts
//! structured product data via a per-store extraction strategy, and maintains
//! an append-only price history per product with change detection to avoid
//! redundant re-scraping.

pub mod adapter;
pub mod config;
pub mod crawler;
pub mod server;
pub mod storage;

use thiserror::Error;

/// Currency code for all recorded prices. Every supported store sells in NOK.
pub const CURRENCY: &str = "NOK";

/// Main error type for discprice operations
#[derive(Debug, Error)]
pub enum DiscPriceError {
    #[error("no sitemap found")]
    NoSitemap,

    #[error("unknown store: {0}")]
    UnknownStore(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for discprice operations
pub type Result<T> = std::result::Result<T, DiscPriceError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use adapter::{find_store, StoreAdapter};
pub use config::Config;
pub use crawler::Crawler;
