//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Store and product upserts (idempotent, keyed by slug / loc)
//! - Append-only price observation history
//! - Crawl run lifecycle tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::DiscPriceError;
use serde::Serialize;
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, DiscPriceError> {
    SqliteStorage::new(path)
}

/// A registered store
///
/// Serializes with camelCase keys; this is also the JSON body of a successful
/// crawl trigger response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRecord {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub base_url: String,
    pub sitemap_url: String,
}

/// A product discovered on a store, keyed by its canonical page URL
#[derive(Debug, Clone)]
pub struct ProductRecord {
    pub id: i64,
    pub loc: String,
    /// Store-supplied change token, compared for equality only
    pub lastmod: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub store_id: i64,
}

/// One entry in a product's append-only price history
#[derive(Debug, Clone)]
pub struct PriceObservation {
    pub id: i64,
    pub product_id: i64,
    pub amount: f64,
    pub currency: String,
    pub created_at: String,
}

/// Descriptive fields written on a product upsert
#[derive(Debug, Clone)]
pub struct ProductUpsert<'a> {
    pub loc: &'a str,
    pub lastmod: &'a str,
    pub store_id: i64,
    pub title: &'a str,
    pub description: &'a str,
    pub image_url: &'a str,
}

/// Represents a background crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub store_slug: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub entries_processed: u64,
    pub error_message: Option<String>,
}

/// Status of a background crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
