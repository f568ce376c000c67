//! Crawl progress observation
//!
//! The coordinator reports progress, skip reasons, and failures as structured
//! events through an injected observer instead of printing ad hoc. The
//! default observer forwards events to tracing; tests install a recording
//! observer to assert on the event stream.

use std::time::Duration;

/// What happened to one sitemap candidate
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    /// Scraped, product upserted, observation appended
    Recorded { amount: f64 },

    /// Unchanged since last crawl; last recorded amount reported without a fetch
    Reused { amount: f64 },

    /// Scraped in dry-run mode; nothing persisted
    Extracted { amount: f64 },

    /// Product page fetch failed; candidate skipped
    SkippedUnavailable,

    /// Page fetched but the adapter found no product data; candidate skipped
    SkippedNoData,

    /// Extraction succeeded but persistence failed; price observed, not recorded
    PriceNotRecorded { amount: f64 },
}

/// Structured crawl progress events
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// Starting one sitemap of a store (1-based index)
    SitemapStarted {
        slug: String,
        sitemap_url: String,
        index: usize,
        total: usize,
    },

    /// One candidate processed
    EntryProcessed {
        slug: String,
        loc: String,
        processed: usize,
        total: usize,
        outcome: EntryOutcome,
    },

    /// Background phase finished
    CrawlFinished {
        slug: String,
        entries_processed: u64,
        elapsed: Duration,
    },
}

/// Sink for crawl progress events
pub trait CrawlObserver: Send + Sync {
    fn observe(&self, event: CrawlEvent);
}

/// Observer that discards every event, for stores with logging disabled
pub struct NoopObserver;

impl CrawlObserver for NoopObserver {
    fn observe(&self, _event: CrawlEvent) {}
}

/// Default observer: forwards events to tracing
pub struct TracingObserver;

impl CrawlObserver for TracingObserver {
    fn observe(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::SitemapStarted {
                slug,
                sitemap_url,
                index,
                total,
            } => {
                tracing::info!(%slug, %sitemap_url, index, total, "sitemap started");
            }
            CrawlEvent::EntryProcessed {
                slug,
                loc,
                processed,
                total,
                outcome,
            } => {
                tracing::info!(%slug, %loc, processed, total, ?outcome, "entry processed");
            }
            CrawlEvent::CrawlFinished {
                slug,
                entries_processed,
                elapsed,
            } => {
                tracing::info!(%slug, entries_processed, ?elapsed, "crawl finished");
            }
        }
    }
}
