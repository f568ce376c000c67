//! HTTP fetcher
//!
//! All network I/O for the crawler goes through here. Fetch failures degrade
//! to `None` instead of propagating: a non-2xx status and a transport error
//! are treated identically as "unavailable", so one broken resource never
//! takes down the rest of a store's crawl.

use crate::config::HttpConfig;
use reqwest::Client;
use std::time::Duration;

/// Builds the shared HTTP client
///
/// One client is built per process and reused for every sitemap and product
/// page fetch; requests within a store invocation are strictly sequential.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns its body on success.
///
/// Returns `None` for any non-2xx status or transport error. Callers decide
/// what "unavailable" means for their unit: an unavailable sitemap degrades
/// to zero candidates, an unavailable product page skips that candidate.
pub async fn fetch_page(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(url, error = %e, "fetch failed");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url, status = status.as_u16(), "fetch returned non-success status");
        return None;
    }

    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::warn!(url, error = %e, "failed to read response body");
            None
        }
    }
}
