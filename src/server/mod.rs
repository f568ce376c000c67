//! HTTP trigger endpoint
//!
//! One route per store slug: `POST /api/stores/crawl/{slug}`. The handler
//! resolves the sitemap, registers the store, and answers with the store
//! metadata right away; the actual crawl continues as a detached background
//! task whose only externally observable outcomes are the persisted rows and
//! the crawl run record.
//!
//! A per-slug in-process guard rejects a second trigger while a store's crawl
//! is still running, so concurrent triggers cannot race on the upserts.

use crate::adapter::{builtin_stores, StoreAdapter};
use crate::config::Config;
use crate::crawler::{
    build_http_client, Crawler, CrawlObserver, NoopObserver, TracingObserver,
};
use crate::storage::{open_storage, SqliteStorage};
use crate::DiscPriceError;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Client;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Shared state behind the trigger routes
#[derive(Clone)]
pub struct AppState {
    storage: Arc<Mutex<SqliteStorage>>,
    client: Client,
    adapters: Arc<HashMap<String, StoreAdapter>>,
    active: Arc<Mutex<HashSet<String>>>,
}

impl AppState {
    /// State over the built-in store registry
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, client: Client) -> Self {
        Self::with_adapters(storage, client, builtin_stores())
    }

    /// State over an explicit adapter list (used by tests)
    pub fn with_adapters(
        storage: Arc<Mutex<SqliteStorage>>,
        client: Client,
        adapters: Vec<StoreAdapter>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.slug.clone(), adapter))
            .collect();

        Self {
            storage,
            client,
            adapters: Arc::new(adapters),
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

/// Releases a slug's in-progress flag when the crawl task ends, however it ends
struct CrawlGuard {
    active: Arc<Mutex<HashSet<String>>>,
    slug: String,
}

impl CrawlGuard {
    fn acquire(active: &Arc<Mutex<HashSet<String>>>, slug: &str) -> Option<Self> {
        let mut set = active.lock().unwrap();
        if !set.insert(slug.to_string()) {
            return None;
        }
        Some(Self {
            active: Arc::clone(active),
            slug: slug.to_string(),
        })
    }
}

impl Drop for CrawlGuard {
    fn drop(&mut self) {
        self.active.lock().unwrap().remove(&self.slug);
    }
}

/// Builds the trigger router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/stores/crawl/{slug}",
            post(trigger_crawl).fallback(method_not_allowed),
        )
        .with_state(state)
}

/// Runs the HTTP trigger server until it is shut down
pub async fn serve(config: &Config) -> crate::Result<()> {
    let storage = open_storage(std::path::Path::new(&config.database.path))?;
    let client = build_http_client(&config.http)?;
    let state = AppState::new(Arc::new(Mutex::new(storage)), client);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %config.server.bind_address, "trigger server listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn method_not_allowed() -> Response {
    (StatusCode::METHOD_NOT_ALLOWED, "method not allowed").into_response()
}

async fn trigger_crawl(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    let adapter = match state.adapters.get(&slug) {
        Some(adapter) => adapter.clone(),
        None => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": "unknown store" })),
            )
                .into_response();
        }
    };

    let guard = match CrawlGuard::acquire(&state.active, &slug) {
        Some(guard) => guard,
        None => {
            return (
                StatusCode::CONFLICT,
                Json(json!({ "message": "crawl already in progress" })),
            )
                .into_response();
        }
    };

    let observer: Arc<dyn CrawlObserver> = if adapter.debug.log {
        Arc::new(TracingObserver)
    } else {
        Arc::new(NoopObserver)
    };

    let mut crawler = Crawler::new(
        adapter,
        Arc::clone(&state.storage),
        state.client.clone(),
        observer,
    );

    let store = match crawler.prepare().await {
        Ok(store) => store,
        Err(DiscPriceError::NoSitemap) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "no sitemap found" })),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!(%slug, error = %e, "crawl preparation failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": "internal error" })),
            )
                .into_response();
        }
    };

    // Fire and forget: the response does not wait for the crawl.
    let background_store = store.clone();
    tokio::spawn(async move {
        let _guard = guard;
        crawler.run(background_store).await;
    });

    (StatusCode::OK, Json(store)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_blocks_second_acquire() {
        let active = Arc::new(Mutex::new(HashSet::new()));

        let first = CrawlGuard::acquire(&active, "prodisc");
        assert!(first.is_some());
        assert!(CrawlGuard::acquire(&active, "prodisc").is_none());

        // Another slug is unaffected.
        assert!(CrawlGuard::acquire(&active, "aceshop").is_some());
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let active = Arc::new(Mutex::new(HashSet::new()));

        let first = CrawlGuard::acquire(&active, "prodisc");
        drop(first);
        assert!(CrawlGuard::acquire(&active, "prodisc").is_some());
    }
}
