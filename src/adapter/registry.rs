//! Static registry of supported stores
//!
//! One adapter per store, keyed by slug. The extraction rules mirror what
//! each store actually publishes: most expose OpenGraph meta tags, the rest
//! need CSS selectors into the product markup.

use super::extract::{ExtractionRules, Normalize, PriceRule, TextSource};
use super::{DebugOptions, EntryFilter, SitemapIndexRule, StoreAdapter};

fn meta_property(name: &str) -> TextSource {
    TextSource::MetaProperty(name.to_string())
}

fn meta_name(name: &str) -> TextSource {
    TextSource::MetaName(name.to_string())
}

fn comma_decimal() -> Vec<Normalize> {
    vec![
        Normalize::StripSuffix(",-".to_string()),
        Normalize::DecimalComma,
    ]
}

fn og_fields(price: PriceRule) -> ExtractionRules {
    ExtractionRules {
        price,
        title: meta_property("og:title"),
        description: meta_property("og:description"),
        image: meta_property("og:image"),
        skip_when_empty: false,
    }
}

/// Builds the full list of store adapters
pub fn builtin_stores() -> Vec<StoreAdapter> {
    vec![
        StoreAdapter {
            name: "Prodisc".to_string(),
            slug: "prodisc".to_string(),
            base_url: "https://prodisc.no/".to_string(),
            sitemap_url: "https://prodisc.no/sitemap.xml".to_string(),
            sitemaps: None,
            sitemap_index: Some(SitemapIndexRule {
                loc_contains: "sitemap_products_1.xml".to_string(),
            }),
            entry_filter: EntryFilter::LocContains("/products/".to_string()),
            extraction: og_fields(PriceRule {
                source: meta_property("og:price:amount"),
                steps: comma_decimal(),
            }),
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "Frisbee Sør".to_string(),
            slug: "frisbeesor".to_string(),
            base_url: "https://www.frisbeesor.no".to_string(),
            sitemap_url: "https://www.frisbeesor.no/sitemap.xml".to_string(),
            sitemaps: Some(vec![
                "https://www.frisbeesor.no/product-sitemap1.xml".to_string(),
                "https://www.frisbeesor.no/product-sitemap2.xml".to_string(),
                "https://www.frisbeesor.no/product-sitemap3.xml".to_string(),
                "https://www.frisbeesor.no/product-sitemap4.xml".to_string(),
            ]),
            sitemap_index: None,
            entry_filter: EntryFilter::LocContains("/produkt/".to_string()),
            extraction: og_fields(PriceRule {
                source: TextSource::Text(".product-page-price .amount".to_string()),
                steps: vec![Normalize::StripPrefix("kr".to_string())],
            }),
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "Aceshop".to_string(),
            slug: "aceshop".to_string(),
            base_url: "https://www.aceshop.no".to_string(),
            sitemap_url: "https://www.aceshop.no/sitemap.xml".to_string(),
            sitemaps: None,
            sitemap_index: None,
            entry_filter: EntryFilter::LocContains("/products/".to_string()),
            extraction: ExtractionRules {
                price: PriceRule {
                    source: TextSource::Text(".product-price".to_string()),
                    steps: comma_decimal(),
                },
                title: meta_property("og:title"),
                description: meta_name("description"),
                image: meta_property("og:image"),
                skip_when_empty: false,
            },
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "Guru Disc Golf".to_string(),
            slug: "gurudiscgolf".to_string(),
            base_url: "https://www.gurudiscgolf.no".to_string(),
            sitemap_url: "https://www.gurudiscgolf.no/sitemap.xml".to_string(),
            sitemaps: Some(vec![
                "https://www.gurudiscgolf.no/product-sitemap1.xml".to_string(),
                "https://www.gurudiscgolf.no/product-sitemap2.xml".to_string(),
                "https://www.gurudiscgolf.no/product-sitemap3.xml".to_string(),
                "https://www.gurudiscgolf.no/product-sitemap4.xml".to_string(),
            ]),
            sitemap_index: None,
            entry_filter: EntryFilter::LocContains("/produkt/".to_string()),
            extraction: og_fields(PriceRule {
                source: TextSource::TextFirst(".woocommerce-Price-amount.amount".to_string()),
                steps: vec![
                    Normalize::StripPrefix("kr".to_string()),
                    Normalize::DecimalComma,
                ],
            }),
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "Krokhold Disc Golf Shop".to_string(),
            slug: "krokholdgs".to_string(),
            base_url: "https://krokholdgs.no/".to_string(),
            sitemap_url: "https://krokholdgs.no/sitemap.xml".to_string(),
            sitemaps: None,
            sitemap_index: None,
            entry_filter: EntryFilter::LocContains("/products/".to_string()),
            extraction: og_fields(PriceRule {
                source: TextSource::Text("span.product-price".to_string()),
                steps: comma_decimal(),
            }),
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "DGShop".to_string(),
            slug: "dgshop".to_string(),
            base_url: "https://www.dgshop.no".to_string(),
            sitemap_url: "https://www.dgshop.no/sitemap.xml".to_string(),
            sitemaps: None,
            sitemap_index: None,
            entry_filter: EntryFilter::PriorityEquals("1.0".to_string()),
            extraction: ExtractionRules {
                price: PriceRule {
                    source: meta_property("product:price:amount"),
                    steps: comma_decimal(),
                },
                title: meta_property("og:title"),
                description: meta_property("og:description"),
                image: meta_property("og:image"),
                // DGShop serves an empty template for delisted products
                skip_when_empty: true,
            },
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "Starframe".to_string(),
            slug: "starframe".to_string(),
            base_url: "https://starframe.no/".to_string(),
            sitemap_url: "https://starframe.no/sitemap.xml".to_string(),
            sitemaps: None,
            sitemap_index: None,
            entry_filter: EntryFilter::LocContains("/products/".to_string()),
            extraction: ExtractionRules {
                price: PriceRule {
                    source: TextSource::TextFirst(".product-price".to_string()),
                    steps: vec![
                        Normalize::StripSuffix(",-".to_string()),
                        Normalize::StripThousands,
                        Normalize::DecimalComma,
                    ],
                },
                title: TextSource::TextFirst("h1.product-title-v1".to_string()),
                description: meta_name("description"),
                image: TextSource::AttrFirst(
                    ".product_page_slider img".to_string(),
                    "src".to_string(),
                ),
                skip_when_empty: false,
            },
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "Spinnvill Disc Golf".to_string(),
            slug: "spinnvilldg".to_string(),
            base_url: "https://spinnvilldg.no/".to_string(),
            sitemap_url: "https://spinnvilldg.no/sitemap.xml".to_string(),
            sitemaps: None,
            sitemap_index: Some(SitemapIndexRule {
                loc_contains: "store-products-sitemap.xml".to_string(),
            }),
            entry_filter: EntryFilter::LocContains("/product-page/".to_string()),
            extraction: og_fields(PriceRule {
                source: meta_property("product:price:amount"),
                steps: comma_decimal(),
            }),
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
        StoreAdapter {
            name: "Frisbeebutikken".to_string(),
            slug: "frisbeebutikken".to_string(),
            base_url: "https://frisbeebutikken.no/".to_string(),
            sitemap_url: "https://frisbeebutikken.no/sitemap.xml".to_string(),
            sitemaps: None,
            sitemap_index: None,
            entry_filter: EntryFilter::LocContains("/products/".to_string()),
            extraction: ExtractionRules {
                price: PriceRule {
                    source: TextSource::Text(".product-price".to_string()),
                    steps: comma_decimal(),
                },
                title: TextSource::Text("h1".to_string()),
                description: meta_name("description"),
                image: TextSource::AttrFirst(
                    ".product_image_price_row img".to_string(),
                    "src".to_string(),
                ),
                skip_when_empty: false,
            },
            debug: DebugOptions {
                log: true,
                max_count: None,
            },
        },
    ]
}

/// Looks up a store adapter by slug
pub fn find_store(slug: &str) -> Option<StoreAdapter> {
    builtin_stores().into_iter().find(|s| s.slug == slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_has_nine_stores() {
        assert_eq!(builtin_stores().len(), 9);
    }

    #[test]
    fn test_slugs_are_unique() {
        let stores = builtin_stores();
        let slugs: HashSet<_> = stores.iter().map(|s| s.slug.as_str()).collect();
        assert_eq!(slugs.len(), stores.len());
    }

    #[test]
    fn test_find_store_by_slug() {
        let store = find_store("prodisc").unwrap();
        assert_eq!(store.name, "Prodisc");
        assert!(store.sitemap_index.is_some());
    }

    #[test]
    fn test_find_unknown_store() {
        assert!(find_store("nosuchstore").is_none());
    }

    #[test]
    fn test_partitioned_stores_declare_sitemaps() {
        for slug in ["frisbeesor", "gurudiscgolf"] {
            let store = find_store(slug).unwrap();
            assert_eq!(store.sitemaps.as_ref().map(Vec::len), Some(4));
        }
    }

    #[test]
    fn test_index_resolving_stores() {
        for slug in ["prodisc", "spinnvilldg"] {
            assert!(find_store(slug).unwrap().sitemap_index.is_some(), "{slug}");
        }
    }
}
