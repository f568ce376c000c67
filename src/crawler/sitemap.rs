//! Sitemap resolution and candidate extraction
//!
//! Sitemaps are parsed with the same HTML parser used for product pages; the
//! sitemap tags (`sitemap`, `url`, `loc`, `lastmod`, `priority`) come through
//! as unknown elements and stay selectable by name.

use crate::adapter::{EntryFilter, SitemapIndexRule};
use crate::crawler::fetch_page;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

/// A candidate product page extracted from a sitemap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    /// Canonical product page URL
    pub loc: String,

    /// Store-supplied change token; opaque, compared for equality only
    pub lastmod: String,
}

fn child_text(element: ElementRef<'_>, selector: &Selector) -> String {
    element
        .select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// Resolves the concrete product sitemap URL out of a sitemap index document.
///
/// Scans `<sitemap><loc>` entries for the rule's needle; the last match wins.
/// Returns `None` when nothing matches, in which case the caller must abort
/// the store's crawl rather than fetch an unresolved URL.
pub fn resolve_sitemap_from_index(document: &Html, rule: &SitemapIndexRule) -> Option<String> {
    let sitemap_selector = Selector::parse("sitemap").ok()?;
    let loc_selector = Selector::parse("loc").ok()?;

    let mut resolved = None;
    for element in document.select(&sitemap_selector) {
        let loc = child_text(element, &loc_selector);
        if loc.contains(rule.loc_contains.as_str()) {
            resolved = Some(loc);
        }
    }

    resolved.filter(|loc| !loc.is_empty())
}

/// Extracts candidate product entries from a sitemap document.
///
/// Walks `<url>` elements in document order, reads their `loc` / `lastmod`
/// children, and keeps the entries matching the store's filter.
pub fn extract_sitemap_entries(document: &Html, filter: &EntryFilter) -> Vec<SitemapEntry> {
    let url_selector = match Selector::parse("url") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let loc_selector = match Selector::parse("loc") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let lastmod_selector = match Selector::parse("lastmod") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    let priority_selector = match Selector::parse("priority") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut entries = Vec::new();
    for element in document.select(&url_selector) {
        let loc = child_text(element, &loc_selector);
        let lastmod = child_text(element, &lastmod_selector);
        let priority = child_text(element, &priority_selector);

        if filter.matches(&loc, &priority) {
            entries.push(SitemapEntry { loc, lastmod });
        }
    }

    entries
}

/// Fetches a sitemap URL and extracts its candidate entries.
///
/// A fetch failure degrades to an empty list so that one unreachable sitemap
/// does not abort a multi-sitemap store.
pub async fn crawl_sitemap(client: &Client, url: &str, filter: &EntryFilter) -> Vec<SitemapEntry> {
    let body = match fetch_page(client, url).await {
        Some(body) => body,
        None => return Vec::new(),
    };

    let document = Html::parse_document(&body);
    extract_sitemap_entries(&document, filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_SITEMAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <url>
                <loc>https://shop.example/products/destroyer</loc>
                <lastmod>2023-05-01</lastmod>
                <priority>1.0</priority>
            </url>
            <url>
                <loc>https://shop.example/pages/about</loc>
                <lastmod>2023-01-15</lastmod>
                <priority>0.5</priority>
            </url>
            <url>
                <loc>https://shop.example/products/wraith</loc>
                <lastmod>2023-04-20</lastmod>
                <priority>1.0</priority>
            </url>
        </urlset>"#;

    const SITEMAP_INDEX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
            <sitemap>
                <loc>https://shop.example/sitemap_pages_1.xml</loc>
            </sitemap>
            <sitemap>
                <loc>https://shop.example/sitemap_products_1.xml</loc>
            </sitemap>
        </sitemapindex>"#;

    #[test]
    fn test_extract_entries_by_loc() {
        let document = Html::parse_document(PRODUCT_SITEMAP);
        let filter = EntryFilter::LocContains("/products/".to_string());

        let entries = extract_sitemap_entries(&document, &filter);
        assert_eq!(
            entries,
            vec![
                SitemapEntry {
                    loc: "https://shop.example/products/destroyer".to_string(),
                    lastmod: "2023-05-01".to_string(),
                },
                SitemapEntry {
                    loc: "https://shop.example/products/wraith".to_string(),
                    lastmod: "2023-04-20".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_extract_entries_by_priority() {
        let document = Html::parse_document(PRODUCT_SITEMAP);
        let filter = EntryFilter::PriorityEquals("1.0".to_string());

        let entries = extract_sitemap_entries(&document, &filter);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].loc, "https://shop.example/products/destroyer");
    }

    #[test]
    fn test_extract_entries_keep_document_order() {
        let document = Html::parse_document(PRODUCT_SITEMAP);
        let filter = EntryFilter::LocContains("/products/".to_string());

        let entries = extract_sitemap_entries(&document, &filter);
        assert_eq!(entries[0].loc, "https://shop.example/products/destroyer");
        assert_eq!(entries[1].loc, "https://shop.example/products/wraith");
    }

    #[test]
    fn test_extract_entries_missing_lastmod() {
        let document = Html::parse_document(
            "<urlset><url><loc>https://shop.example/products/x</loc></url></urlset>",
        );
        let filter = EntryFilter::LocContains("/products/".to_string());

        let entries = extract_sitemap_entries(&document, &filter);
        assert_eq!(entries[0].lastmod, "");
    }

    #[test]
    fn test_resolve_sitemap_from_index() {
        let document = Html::parse_document(SITEMAP_INDEX);
        let rule = SitemapIndexRule {
            loc_contains: "sitemap_products_1.xml".to_string(),
        };

        assert_eq!(
            resolve_sitemap_from_index(&document, &rule),
            Some("https://shop.example/sitemap_products_1.xml".to_string())
        );
    }

    #[test]
    fn test_resolve_sitemap_no_match() {
        let document = Html::parse_document(SITEMAP_INDEX);
        let rule = SitemapIndexRule {
            loc_contains: "store-products-sitemap.xml".to_string(),
        };

        assert_eq!(resolve_sitemap_from_index(&document, &rule), None);
    }

    #[test]
    fn test_resolve_sitemap_last_match_wins() {
        let document = Html::parse_document(
            r#"<sitemapindex>
                <sitemap><loc>https://shop.example/products-a.xml</loc></sitemap>
                <sitemap><loc>https://shop.example/products-b.xml</loc></sitemap>
            </sitemapindex>"#,
        );
        let rule = SitemapIndexRule {
            loc_contains: "products".to_string(),
        };

        assert_eq!(
            resolve_sitemap_from_index(&document, &rule),
            Some("https://shop.example/products-b.xml".to_string())
        );
    }
}
