//! Change detection
//!
//! Decides per candidate whether a fresh page fetch is required, using the
//! sitemap's change token and the recorded price history. This is a cheap
//! heuristic to bound request volume: a store may change a price without
//! touching `lastmod`, and that staleness window is accepted.

use crate::storage::{PriceObservation, ProductRecord};

/// Outcome of change detection for one candidate URL
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlDecision {
    /// Fetch and scrape the product page
    Scrape,

    /// Skip the fetch and report the last recorded amount as current
    Reuse { amount: f64 },
}

/// Decides whether a candidate needs scraping.
///
/// - First sighting (no product recorded for the URL): scrape.
/// - Unchanged token and at least one recorded observation: reuse.
/// - Changed token, or unchanged token with an empty history: scrape.
pub fn decide(
    existing: Option<&ProductRecord>,
    latest: Option<&PriceObservation>,
    change_token: &str,
) -> CrawlDecision {
    if let Some(product) = existing {
        if product.lastmod == change_token {
            if let Some(observation) = latest {
                return CrawlDecision::Reuse {
                    amount: observation.amount,
                };
            }
        }
    }

    CrawlDecision::Scrape
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(lastmod: &str) -> ProductRecord {
        ProductRecord {
            id: 1,
            loc: "https://shop.example/products/destroyer".to_string(),
            lastmod: lastmod.to_string(),
            title: "Destroyer".to_string(),
            description: String::new(),
            image_url: String::new(),
            store_id: 1,
        }
    }

    fn observation(amount: f64) -> PriceObservation {
        PriceObservation {
            id: 1,
            product_id: 1,
            amount,
            currency: "NOK".to_string(),
            created_at: "2023-05-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_first_sighting_scrapes() {
        assert_eq!(decide(None, None, "2023-05-01"), CrawlDecision::Scrape);
    }

    #[test]
    fn test_unchanged_token_with_history_reuses() {
        let product = product("2023-05-01");
        let latest = observation(199.0);
        assert_eq!(
            decide(Some(&product), Some(&latest), "2023-05-01"),
            CrawlDecision::Reuse { amount: 199.0 }
        );
    }

    #[test]
    fn test_changed_token_scrapes() {
        let product = product("2023-05-01");
        let latest = observation(199.0);
        assert_eq!(
            decide(Some(&product), Some(&latest), "2023-06-01"),
            CrawlDecision::Scrape
        );
    }

    #[test]
    fn test_unchanged_token_without_history_scrapes() {
        let product = product("2023-05-01");
        assert_eq!(
            decide(Some(&product), None, "2023-05-01"),
            CrawlDecision::Scrape
        );
    }
}
