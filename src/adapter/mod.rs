//! Store adapter model
//!
//! An adapter is a declarative description of one store's crawl behavior:
//! identity metadata, which sitemap(s) to read, how to recognize product
//! entries in them, and how to extract product fields from a product page.
//! Adapters hold plain data and perform no I/O; all fetching and parsing is
//! done by the crawler engine, which hands parsed documents to the rules
//! defined here.

mod extract;
mod registry;

pub use extract::{
    extract_product, normalize_price, read_text, ExtractionRules, Normalize, PriceRule,
    ProductFields, TextSource,
};
pub use registry::{builtin_stores, find_store};

/// Declarative crawl configuration for a single store
#[derive(Debug, Clone)]
pub struct StoreAdapter {
    /// Display name, e.g. "Frisbee Sør"
    pub name: String,

    /// Stable identity used as the upsert key and trigger route segment
    pub slug: String,

    /// Store front page
    pub base_url: String,

    /// Primary sitemap URL. When `sitemap_index` is set this points at the
    /// sitemap *index* document instead of a product sitemap.
    pub sitemap_url: String,

    /// Explicit product-sitemap partitions. When present the crawler iterates
    /// these in order instead of `sitemap_url`.
    pub sitemaps: Option<Vec<String>>,

    /// Rule for resolving the concrete product sitemap out of a sitemap index
    pub sitemap_index: Option<SitemapIndexRule>,

    /// Which `<url>` entries of a sitemap represent product pages
    pub entry_filter: EntryFilter,

    /// Product page field extraction rules
    pub extraction: ExtractionRules,

    pub debug: DebugOptions,
}

/// Matches a nested sitemap URL inside a sitemap index document.
///
/// The last `<sitemap><loc>` entry containing the needle wins, matching how
/// the stores publish a single product sitemap among several others.
#[derive(Debug, Clone)]
pub struct SitemapIndexRule {
    pub loc_contains: String,
}

/// Store-specific predicate selecting product entries from a sitemap
#[derive(Debug, Clone)]
pub enum EntryFilter {
    /// Keep entries whose `<loc>` contains the needle (e.g. "/products/")
    LocContains(String),

    /// Keep entries whose `<priority>` equals the value exactly
    PriorityEquals(String),
}

impl EntryFilter {
    /// Applies the predicate to one sitemap `<url>` entry
    pub fn matches(&self, loc: &str, priority: &str) -> bool {
        match self {
            Self::LocContains(needle) => loc.contains(needle.as_str()),
            Self::PriorityEquals(value) => priority == value,
        }
    }
}

/// Per-store debug options
#[derive(Debug, Clone, Default)]
pub struct DebugOptions {
    /// Emit progress events for every processed entry
    pub log: bool,

    /// Stop after this many entries per sitemap, for one invocation only.
    /// Re-invoking starts from the top of the list again; unchanged entries
    /// are then skipped by change detection rather than by a checkpoint.
    pub max_count: Option<usize>,
}
