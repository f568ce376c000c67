//! Integration tests for the HTTP trigger endpoint

use discprice::adapter::{
    DebugOptions, EntryFilter, ExtractionRules, Normalize, PriceRule, SitemapIndexRule,
    StoreAdapter, TextSource,
};
use discprice::server::{router, AppState};
use discprice::storage::{RunStatus, SqliteStorage, Storage};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_adapter(base: &str) -> StoreAdapter {
    StoreAdapter {
        name: "Test Store".to_string(),
        slug: "teststore".to_string(),
        base_url: base.to_string(),
        sitemap_url: format!("{base}/sitemap.xml"),
        sitemaps: None,
        sitemap_index: None,
        entry_filter: EntryFilter::LocContains("/products/".to_string()),
        extraction: ExtractionRules {
            price: PriceRule {
                source: TextSource::MetaProperty("og:price:amount".to_string()),
                steps: vec![
                    Normalize::StripSuffix(",-".to_string()),
                    Normalize::DecimalComma,
                ],
            },
            title: TextSource::MetaProperty("og:title".to_string()),
            description: TextSource::MetaProperty("og:description".to_string()),
            image: TextSource::MetaProperty("og:image".to_string()),
            skip_when_empty: false,
        },
        debug: DebugOptions {
            log: false,
            max_count: None,
        },
    }
}

/// Binds the trigger router on an ephemeral port and returns its base URL
async fn spawn_server(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

fn shared_storage() -> Arc<Mutex<SqliteStorage>> {
    Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()))
}

/// Waits until the store's latest run reaches a terminal state
async fn wait_for_run(storage: &Arc<Mutex<SqliteStorage>>, slug: &str) {
    for _ in 0..250 {
        {
            let storage = storage.lock().unwrap();
            if let Some(run) = storage.latest_run(slug).unwrap() {
                if run.status != RunStatus::Running {
                    return;
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("crawl for {slug} did not finish in time");
}

#[tokio::test]
async fn test_trigger_returns_store_metadata_before_crawl_completes() {
    let mock = MockServer::start().await;
    let base = mock.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{base}/products/disc</loc><lastmod>2023-05-01</lastmod></url></urlset>"
        )))
        .mount(&mock)
        .await;
    // Slow product page: the trigger response must not wait for it.
    Mock::given(method("GET"))
        .and(path("/products/disc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><head><meta property="og:price:amount" content="199,-"></head></html>"#,
                )
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&mock)
        .await;

    let storage = shared_storage();
    let state = AppState::with_adapters(
        Arc::clone(&storage),
        reqwest::Client::new(),
        vec![test_adapter(&base)],
    );
    let server = spawn_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("{server}/api/stores/crawl/teststore"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["slug"], "teststore");
    assert_eq!(body["name"], "Test Store");
    assert_eq!(body["baseUrl"], base);
    assert_eq!(body["sitemapUrl"], format!("{base}/sitemap.xml"));
    assert!(body["id"].is_i64());

    // The store row exists immediately; the product lands only after the
    // detached crawl finishes.
    assert!(storage.lock().unwrap().find_store("teststore").unwrap().is_some());

    wait_for_run(&storage, "teststore").await;

    let storage = storage.lock().unwrap();
    let run = storage.latest_run("teststore").unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.entries_processed, 1);
    assert!(storage
        .find_product(&format!("{base}/products/disc"))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_non_post_method_is_rejected_without_side_effects() {
    let storage = shared_storage();
    let state = AppState::with_adapters(
        Arc::clone(&storage),
        reqwest::Client::new(),
        vec![test_adapter("http://127.0.0.1:1")],
    );
    let server = spawn_server(state).await;

    let response = reqwest::Client::new()
        .get(format!("{server}/api/stores/crawl/teststore"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
    assert_eq!(response.text().await.unwrap(), "method not allowed");

    // No crawl work was performed, not even the store upsert.
    assert!(storage.lock().unwrap().find_store("teststore").unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_store_is_404() {
    let state = AppState::with_adapters(shared_storage(), reqwest::Client::new(), vec![]);
    let server = spawn_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("{server}/api/stores/crawl/nosuchstore"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "unknown store");
}

#[tokio::test]
async fn test_unresolvable_sitemap_index_is_500_no_sitemap_found() {
    let mock = MockServer::start().await;
    let base = mock.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<sitemapindex><sitemap><loc>https://shop.example/pages.xml</loc></sitemap></sitemapindex>",
        ))
        .mount(&mock)
        .await;

    let mut adapter = test_adapter(&base);
    adapter.sitemap_index = Some(SitemapIndexRule {
        loc_contains: "sitemap_products_1.xml".to_string(),
    });

    let storage = shared_storage();
    let state =
        AppState::with_adapters(Arc::clone(&storage), reqwest::Client::new(), vec![adapter]);
    let server = spawn_server(state).await;

    let response = reqwest::Client::new()
        .post(format!("{server}/api/stores/crawl/teststore"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["message"], "no sitemap found");

    // Aborted before registration.
    assert!(storage.lock().unwrap().find_store("teststore").unwrap().is_none());
}

#[tokio::test]
async fn test_concurrent_trigger_for_same_store_is_409() {
    let mock = MockServer::start().await;
    let base = mock.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<urlset><url><loc>{base}/products/disc</loc><lastmod>2023-05-01</lastmod></url></urlset>"
        )))
        .mount(&mock)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/disc"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(
                    r#"<html><head><meta property="og:price:amount" content="199,-"></head></html>"#,
                )
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock)
        .await;

    let storage = shared_storage();
    let state = AppState::with_adapters(
        Arc::clone(&storage),
        reqwest::Client::new(),
        vec![test_adapter(&base)],
    );
    let server = spawn_server(state).await;
    let client = reqwest::Client::new();

    let first = client
        .post(format!("{server}/api/stores/crawl/teststore"))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    // The background crawl is still stuck on the slow product page.
    let second = client
        .post(format!("{server}/api/stores/crawl/teststore"))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["message"], "crawl already in progress");

    wait_for_run(&storage, "teststore").await;
    // The in-progress flag clears right after the run record is finalized.
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Once the first crawl finished, a new trigger is accepted again.
    let third = client
        .post(format!("{server}/api/stores/crawl/teststore"))
        .send()
        .await
        .unwrap();
    assert_eq!(third.status(), 200);
    wait_for_run(&storage, "teststore").await;
}
