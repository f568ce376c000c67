//! Product page field extraction
//!
//! Each store publishes product data in a slightly different DOM location and
//! price format. This module models those differences as data: a `TextSource`
//! names where a field lives, and a `PriceRule` pairs a source with an ordered
//! list of normalization steps that reduce locale-formatted price strings
//! ("199,-", "kr 249", "1.299,50") to a plain numeric value.

use scraper::{Html, Selector};

/// Structured fields extracted from one product page
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub price: f64,
    pub title: String,
    pub description: String,
    pub image_url: String,
}

/// Where in a document a text value is read from
#[derive(Debug, Clone)]
pub enum TextSource {
    /// `<meta property="...">` content attribute
    MetaProperty(String),

    /// `<meta name="...">` content attribute
    MetaName(String),

    /// Concatenated text of every node matching the selector
    Text(String),

    /// Text of the first node matching the selector
    TextFirst(String),

    /// Attribute of the first node matching the selector
    AttrFirst(String, String),
}

/// A single price normalization step. Steps compose left to right; the
/// intermediate value is trimmed after every step.
#[derive(Debug, Clone)]
pub enum Normalize {
    /// Drop a literal suffix, e.g. ",-"
    StripSuffix(String),

    /// Drop a literal prefix, e.g. "kr"
    StripPrefix(String),

    /// Remove thousand-separator dots ("1.299" -> "1299")
    StripThousands,

    /// Convert a decimal comma to a decimal point ("299,50" -> "299.50")
    DecimalComma,
}

/// Price extraction: raw string source plus normalization pipeline
#[derive(Debug, Clone)]
pub struct PriceRule {
    pub source: TextSource,
    pub steps: Vec<Normalize>,
}

/// Field extraction rules for one store's product pages
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub price: PriceRule,
    pub title: TextSource,
    pub description: TextSource,
    pub image: TextSource,

    /// Treat a page as "no product present" when every field, including the
    /// raw price string, comes back empty. Stores that serve placeholder
    /// pages for delisted products set this to avoid recording empty rows.
    pub skip_when_empty: bool,
}

/// Reads a text value from the document per the given source.
///
/// Missing nodes, missing attributes, and invalid selectors all degrade to an
/// empty string; extraction never fails on malformed markup.
pub fn read_text(document: &Html, source: &TextSource) -> String {
    match source {
        TextSource::MetaProperty(name) => {
            attr_of_first(document, &format!("meta[property=\"{}\"]", name), "content")
        }
        TextSource::MetaName(name) => {
            attr_of_first(document, &format!("meta[name=\"{}\"]", name), "content")
        }
        TextSource::Text(css) => {
            let selector = match Selector::parse(css) {
                Ok(s) => s,
                Err(_) => return String::new(),
            };
            document
                .select(&selector)
                .flat_map(|element| element.text())
                .collect::<String>()
                .trim()
                .to_string()
        }
        TextSource::TextFirst(css) => {
            let selector = match Selector::parse(css) {
                Ok(s) => s,
                Err(_) => return String::new(),
            };
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        }
        TextSource::AttrFirst(css, attr) => attr_of_first(document, css, attr),
    }
}

fn attr_of_first(document: &Html, css: &str, attr: &str) -> String {
    let selector = match Selector::parse(css) {
        Ok(s) => s,
        Err(_) => return String::new(),
    };
    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

/// Runs the normalization pipeline over a raw price string and parses the
/// result. A remainder that is not a number (including the empty string)
/// yields `0.0`, the "no price found" sentinel.
pub fn normalize_price(raw: &str, steps: &[Normalize]) -> f64 {
    let mut value = raw.trim().to_string();

    for step in steps {
        value = match step {
            Normalize::StripSuffix(suffix) => value
                .strip_suffix(suffix.as_str())
                .unwrap_or(&value)
                .to_string(),
            Normalize::StripPrefix(prefix) => value
                .strip_prefix(prefix.as_str())
                .unwrap_or(&value)
                .to_string(),
            Normalize::StripThousands => value.replace('.', ""),
            Normalize::DecimalComma => value.replace(',', "."),
        };
        value = value.trim().to_string();
    }

    value.parse::<f64>().unwrap_or(0.0)
}

/// Extracts product fields from a parsed product page.
///
/// Returns `None` when the rules signal that no product data is present
/// (see [`ExtractionRules::skip_when_empty`]); the caller must then skip the
/// page without any persistence side effect. This is distinct from a parsed
/// page with a price of `0.0`, which is a valid observation.
pub fn extract_product(document: &Html, rules: &ExtractionRules) -> Option<ProductFields> {
    let raw_price = read_text(document, &rules.price.source);
    let title = read_text(document, &rules.title);
    let description = read_text(document, &rules.description);
    let image_url = read_text(document, &rules.image);

    if rules.skip_when_empty
        && raw_price.is_empty()
        && title.is_empty()
        && description.is_empty()
        && image_url.is_empty()
    {
        return None;
    }

    Some(ProductFields {
        price: normalize_price(&raw_price, &rules.price.steps),
        title,
        description,
        image_url,
    })
}
