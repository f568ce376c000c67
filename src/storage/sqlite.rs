//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{
    PriceObservation, ProductRecord, ProductUpsert, RunRecord, RunStatus, StoreRecord,
};
use crate::DiscPriceError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> Result<Self, DiscPriceError> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self, DiscPriceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn store_from_row(row: &Row<'_>) -> rusqlite::Result<StoreRecord> {
    Ok(StoreRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        name: row.get(2)?,
        base_url: row.get(3)?,
        sitemap_url: row.get(4)?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<ProductRecord> {
    Ok(ProductRecord {
        id: row.get(0)?,
        loc: row.get(1)?,
        lastmod: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        image_url: row.get(5)?,
        store_id: row.get(6)?,
    })
}

fn observation_from_row(row: &Row<'_>) -> rusqlite::Result<PriceObservation> {
    Ok(PriceObservation {
        id: row.get(0)?,
        product_id: row.get(1)?,
        amount: row.get(2)?,
        currency: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        store_slug: row.get(1)?,
        started_at: row.get(2)?,
        finished_at: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Failed),
        entries_processed: row.get::<_, i64>(5)? as u64,
        error_message: row.get(6)?,
    })
}

const STORE_COLUMNS: &str = "id, slug, name, base_url, sitemap_url";
const PRODUCT_COLUMNS: &str = "id, loc, lastmod, title, description, image_url, store_id";
const OBSERVATION_COLUMNS: &str = "id, product_id, amount, currency, created_at";
const RUN_COLUMNS: &str =
    "id, store_slug, started_at, finished_at, status, entries_processed, error_message";

impl Storage for SqliteStorage {
    // ===== Stores =====

    fn upsert_store(
        &mut self,
        slug: &str,
        name: &str,
        base_url: &str,
        sitemap_url: &str,
    ) -> StorageResult<StoreRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO stores (slug, name, base_url, sitemap_url, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(slug) DO UPDATE SET
                 name = excluded.name,
                 base_url = excluded.base_url,
                 sitemap_url = excluded.sitemap_url,
                 updated_at = excluded.updated_at",
            params![slug, name, base_url, sitemap_url, now],
        )?;

        self.find_store(slug)?
            .ok_or_else(|| StorageError::StoreNotFound(slug.to_string()))
    }

    fn find_store(&self, slug: &str) -> StorageResult<Option<StoreRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM stores WHERE slug = ?1", STORE_COLUMNS))?;

        let store = stmt.query_row(params![slug], store_from_row).optional()?;
        Ok(store)
    }

    fn list_stores(&self) -> StorageResult<Vec<StoreRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM stores ORDER BY slug", STORE_COLUMNS))?;

        let stores = stmt
            .query_map([], store_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(stores)
    }

    // ===== Products =====

    fn upsert_product(&mut self, upsert: &ProductUpsert<'_>) -> StorageResult<ProductRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO products
                 (loc, lastmod, title, description, image_url, store_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(loc) DO UPDATE SET
                 lastmod = excluded.lastmod,
                 title = excluded.title,
                 description = excluded.description,
                 image_url = excluded.image_url,
                 updated_at = excluded.updated_at",
            params![
                upsert.loc,
                upsert.lastmod,
                upsert.title,
                upsert.description,
                upsert.image_url,
                upsert.store_id,
                now
            ],
        )?;

        self.find_product(upsert.loc)?
            .ok_or_else(|| StorageError::ProductNotFound(upsert.loc.to_string()))
    }

    fn find_product(&self, loc: &str) -> StorageResult<Option<ProductRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM products WHERE loc = ?1",
            PRODUCT_COLUMNS
        ))?;

        let product = stmt.query_row(params![loc], product_from_row).optional()?;
        Ok(product)
    }

    fn count_products(&self, store_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM products WHERE store_id = ?1",
            params![store_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Price observations =====

    fn append_observation(
        &mut self,
        product_id: i64,
        amount: f64,
        currency: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO price_observations (product_id, amount, currency, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![product_id, amount, currency, now],
        )?;
        Ok(())
    }

    fn latest_observation(&self, product_id: i64) -> StorageResult<Option<PriceObservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM price_observations WHERE product_id = ?1 ORDER BY id DESC LIMIT 1",
            OBSERVATION_COLUMNS
        ))?;

        let observation = stmt
            .query_row(params![product_id], observation_from_row)
            .optional()?;
        Ok(observation)
    }

    fn observations(&self, product_id: i64) -> StorageResult<Vec<PriceObservation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM price_observations WHERE product_id = ?1 ORDER BY id ASC",
            OBSERVATION_COLUMNS
        ))?;

        let observations = stmt
            .query_map(params![product_id], observation_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(observations)
    }

    fn count_observations(&self, store_id: i64) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM price_observations o
             JOIN products p ON p.id = o.product_id
             WHERE p.store_id = ?1",
            params![store_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    // ===== Crawl runs =====

    fn create_run(&mut self, store_slug: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_runs (store_slug, started_at, status) VALUES (?1, ?2, ?3)",
            params![store_slug, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64, entries_processed: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, entries_processed = ?3
             WHERE id = ?4",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                entries_processed as i64,
                run_id
            ],
        )?;
        Ok(())
    }

    fn fail_run(&mut self, run_id: i64, error_message: &str) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2, error_message = ?3
             WHERE id = ?4",
            params![RunStatus::Failed.to_db_string(), now, error_message, run_id],
        )?;
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM crawl_runs WHERE id = ?1", RUN_COLUMNS))?;

        let run = stmt
            .query_row(params![run_id], run_from_row)
            .map_err(|_| StorageError::RunNotFound(run_id))?;

        Ok(run)
    }

    fn latest_run(&self, store_slug: &str) -> StorageResult<Option<RunRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawl_runs WHERE store_slug = ?1 ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))?;

        let run = stmt.query_row(params![store_slug], run_from_row).optional()?;
        Ok(run)
    }
}
