//! Crawl coordinator - per-store orchestration
//!
//! Drives one store invocation end to end:
//! 1. Resolve the product sitemap from an index document when the adapter
//!    needs it; resolution failure aborts with "no sitemap found".
//! 2. Register (upsert) the store so its metadata stays current.
//! 3. Hand the store record back for the early trigger response.
//! 4. Crawl each sitemap sequentially, one candidate at a time:
//!    change-detect, scrape when needed, record product and price.
//!
//! Steps 1-3 run in [`Crawler::prepare`]; step 4 is [`Crawler::run`], which
//! the trigger endpoint spawns as a detached background task.

use crate::adapter::{extract_product, StoreAdapter};
use crate::crawler::detector::{decide, CrawlDecision};
use crate::crawler::fetcher::fetch_page;
use crate::crawler::observer::{CrawlEvent, CrawlObserver, EntryOutcome};
use crate::crawler::sitemap::{crawl_sitemap, resolve_sitemap_from_index, SitemapEntry};
use crate::storage::{ProductUpsert, SqliteStorage, Storage, StoreRecord};
use crate::{DiscPriceError, Result, CURRENCY};
use reqwest::Client;
use scraper::Html;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use url::Url;

/// Result of one store invocation's background phase
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub entries_processed: u64,
    pub elapsed: Duration,
}

/// Per-store crawl driver
pub struct Crawler {
    adapter: StoreAdapter,
    storage: Arc<Mutex<SqliteStorage>>,
    client: Client,
    observer: Arc<dyn CrawlObserver>,
    dry_run: bool,
}

impl Crawler {
    pub fn new(
        adapter: StoreAdapter,
        storage: Arc<Mutex<SqliteStorage>>,
        client: Client,
        observer: Arc<dyn CrawlObserver>,
    ) -> Self {
        Self {
            adapter,
            storage,
            client,
            observer,
            dry_run: false,
        }
    }

    /// Skip product and price persistence; the store is still registered and
    /// every candidate is still fetched and extracted.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Resolves the sitemap and registers the store.
    ///
    /// Returns the registered store record, which the trigger endpoint sends
    /// back to the caller before any sitemap crawling starts. When the
    /// adapter resolves its sitemap through an index document, a failed fetch
    /// or an index with no matching entry aborts with
    /// [`DiscPriceError::NoSitemap`] before anything is fetched from the
    /// unresolved URL.
    pub async fn prepare(&mut self) -> Result<StoreRecord> {
        if let Some(rule) = self.adapter.sitemap_index.clone() {
            let body = fetch_page(&self.client, &self.adapter.sitemap_url)
                .await
                .ok_or(DiscPriceError::NoSitemap)?;

            let resolved = {
                let document = Html::parse_document(&body);
                resolve_sitemap_from_index(&document, &rule)
            };

            let resolved = resolved.ok_or(DiscPriceError::NoSitemap)?;

            // A relative or malformed loc in the index is as unusable as no
            // match at all.
            if Url::parse(&resolved).is_err() {
                return Err(DiscPriceError::NoSitemap);
            }
            self.adapter.sitemap_url = resolved;
        }

        let store = {
            let mut storage = self.storage.lock().unwrap();
            storage.upsert_store(
                &self.adapter.slug,
                &self.adapter.name,
                &self.adapter.base_url,
                &self.adapter.sitemap_url,
            )?
        };

        Ok(store)
    }

    /// Runs the background phase: every sitemap, every candidate, strictly
    /// sequentially.
    ///
    /// Per-candidate failures are contained to that candidate and surface
    /// only through observer events and logs; the method itself always runs
    /// to the end of the list. The run is recorded in the crawl_runs table.
    pub async fn run(self, store: StoreRecord) -> CrawlSummary {
        let slug = self.adapter.slug.clone();
        let start = Instant::now();

        let run_id = match self.storage.lock().unwrap().create_run(&slug) {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(%slug, error = %e, "failed to record crawl run start");
                None
            }
        };

        let sitemaps = match &self.adapter.sitemaps {
            Some(list) => list.clone(),
            None => vec![self.adapter.sitemap_url.clone()],
        };
        let sitemap_total = sitemaps.len();

        let mut entries_processed: u64 = 0;
        for (index, sitemap_url) in sitemaps.iter().enumerate() {
            self.observer.observe(CrawlEvent::SitemapStarted {
                slug: slug.clone(),
                sitemap_url: sitemap_url.clone(),
                index: index + 1,
                total: sitemap_total,
            });

            entries_processed += self.crawl_single_sitemap(&store, sitemap_url).await;
        }

        if let Some(run_id) = run_id {
            let mut storage = self.storage.lock().unwrap();
            if let Err(e) = storage.complete_run(run_id, entries_processed) {
                tracing::warn!(%slug, error = %e, "failed to record crawl run completion");
                let _ = storage.fail_run(run_id, &e.to_string());
            }
        }

        let elapsed = start.elapsed();
        self.observer.observe(CrawlEvent::CrawlFinished {
            slug,
            entries_processed,
            elapsed,
        });

        CrawlSummary {
            entries_processed,
            elapsed,
        }
    }

    /// Processes the candidates of one sitemap in document order, honoring
    /// the adapter's per-sitemap `max_count` cap. Returns how many entries
    /// were processed.
    async fn crawl_single_sitemap(&self, store: &StoreRecord, sitemap_url: &str) -> u64 {
        let entries = crawl_sitemap(&self.client, sitemap_url, &self.adapter.entry_filter).await;
        let total = entries.len();

        let mut count = 0usize;
        for entry in &entries {
            let outcome = self.process_entry(store, entry).await;
            count += 1;

            self.observer.observe(CrawlEvent::EntryProcessed {
                slug: self.adapter.slug.clone(),
                loc: entry.loc.clone(),
                processed: count,
                total,
                outcome,
            });

            if let Some(max) = self.adapter.debug.max_count {
                if count >= max {
                    break;
                }
            }
        }

        count as u64
    }

    /// DETECT -> [SCRAPE] -> RECORD for one candidate
    async fn process_entry(&self, store: &StoreRecord, entry: &SitemapEntry) -> EntryOutcome {
        let (existing, latest) = {
            let storage = self.storage.lock().unwrap();
            match storage.find_product(&entry.loc) {
                Ok(product) => {
                    let latest = product
                        .as_ref()
                        .and_then(|p| match storage.latest_observation(p.id) {
                            Ok(observation) => observation,
                            Err(e) => {
                                tracing::warn!(loc = %entry.loc, error = %e, "price lookup failed");
                                None
                            }
                        });
                    (product, latest)
                }
                Err(e) => {
                    tracing::warn!(loc = %entry.loc, error = %e, "product lookup failed");
                    (None, None)
                }
            }
        };

        if let CrawlDecision::Reuse { amount } =
            decide(existing.as_ref(), latest.as_ref(), &entry.lastmod)
        {
            return EntryOutcome::Reused { amount };
        }

        let body = match fetch_page(&self.client, &entry.loc).await {
            Some(body) => body,
            None => return EntryOutcome::SkippedUnavailable,
        };

        let fields = {
            let document = Html::parse_document(&body);
            extract_product(&document, &self.adapter.extraction)
        };
        let fields = match fields {
            Some(fields) => fields,
            None => return EntryOutcome::SkippedNoData,
        };

        if self.dry_run {
            return EntryOutcome::Extracted {
                amount: fields.price,
            };
        }

        let mut storage = self.storage.lock().unwrap();
        let product = match storage.upsert_product(&ProductUpsert {
            loc: &entry.loc,
            lastmod: &entry.lastmod,
            store_id: store.id,
            title: &fields.title,
            description: &fields.description,
            image_url: &fields.image_url,
        }) {
            Ok(product) => product,
            Err(e) => {
                tracing::error!(loc = %entry.loc, error = %e, "product upsert failed");
                return EntryOutcome::PriceNotRecorded {
                    amount: fields.price,
                };
            }
        };

        if let Err(e) = storage.append_observation(product.id, fields.price, CURRENCY) {
            tracing::error!(loc = %entry.loc, error = %e, "price append failed");
            return EntryOutcome::PriceNotRecorded {
                amount: fields.price,
            };
        }

        EntryOutcome::Recorded {
            amount: fields.price,
        }
    }
}
