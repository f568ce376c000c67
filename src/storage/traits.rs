//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::storage::{PriceObservation, ProductRecord, ProductUpsert, RunRecord, StoreRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Store not found: {0}")]
    StoreNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// All mutation goes through keyed upserts (stores, products) or pure appends
/// (price observations), so callers need no locking discipline beyond what a
/// single call already guarantees.
pub trait Storage {
    // ===== Stores =====

    /// Creates or updates a store keyed by slug.
    ///
    /// Metadata (name, base URL, sitemap URL) is refreshed on every call so
    /// the store's identity stays current even when no sitemap turns out to
    /// be crawlable afterwards.
    fn upsert_store(
        &mut self,
        slug: &str,
        name: &str,
        base_url: &str,
        sitemap_url: &str,
    ) -> StorageResult<StoreRecord>;

    /// Gets a store by slug
    fn find_store(&self, slug: &str) -> StorageResult<Option<StoreRecord>>;

    /// Lists all registered stores
    fn list_stores(&self) -> StorageResult<Vec<StoreRecord>>;

    // ===== Products =====

    /// Creates or updates a product keyed by `loc`.
    ///
    /// Create writes every field; update refreshes `lastmod` and the
    /// descriptive fields but never moves the product to another store.
    fn upsert_product(&mut self, upsert: &ProductUpsert<'_>) -> StorageResult<ProductRecord>;

    /// Gets a product by its canonical page URL
    fn find_product(&self, loc: &str) -> StorageResult<Option<ProductRecord>>;

    /// Counts products belonging to a store
    fn count_products(&self, store_id: i64) -> StorageResult<u64>;

    // ===== Price observations =====

    /// Appends one price observation to a product's history.
    ///
    /// Always appends, even when the amount equals the previous observation;
    /// the history is a raw time series, not a dedup log.
    fn append_observation(
        &mut self,
        product_id: i64,
        amount: f64,
        currency: &str,
    ) -> StorageResult<()>;

    /// Gets the most recent observation for a product, if any
    fn latest_observation(&self, product_id: i64) -> StorageResult<Option<PriceObservation>>;

    /// Gets a product's full history, oldest first
    fn observations(&self, product_id: i64) -> StorageResult<Vec<PriceObservation>>;

    /// Counts observations belonging to a store's products
    fn count_observations(&self, store_id: i64) -> StorageResult<u64>;

    // ===== Crawl runs =====

    /// Records the start of a background crawl for a store
    fn create_run(&mut self, store_slug: &str) -> StorageResult<i64>;

    /// Marks a run completed with the number of entries it processed
    fn complete_run(&mut self, run_id: i64, entries_processed: u64) -> StorageResult<()>;

    /// Marks a run failed
    fn fail_run(&mut self, run_id: i64, error_message: &str) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run for a store
    fn latest_run(&self, store_slug: &str) -> StorageResult<Option<RunRecord>>;
}
