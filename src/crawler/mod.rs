//! Crawler engine
//!
//! This module contains the generic crawl machinery that every store adapter
//! runs through:
//! - HTTP fetching with degrade-on-failure semantics
//! - Sitemap index resolution and candidate extraction
//! - Change detection against recorded products
//! - Product page scraping and price recording
//! - The coordinator driving one store invocation end to end

mod coordinator;
mod detector;
mod fetcher;
mod observer;
mod sitemap;

pub use coordinator::{CrawlSummary, Crawler};
pub use detector::{decide, CrawlDecision};
pub use fetcher::{build_http_client, fetch_page};
pub use observer::{CrawlEvent, CrawlObserver, EntryOutcome, NoopObserver, TracingObserver};
pub use sitemap::{
    crawl_sitemap, extract_sitemap_entries, resolve_sitemap_from_index, SitemapEntry,
};
