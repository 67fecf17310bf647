//! Integration tests for the harvester
//!
//! These tests use wiremock to serve listing and product pages and run the
//! full traversal end-to-end.

use product_harvester::config::{FetchConfig, SiteConfig, SiteProfile};
use product_harvester::crawler::{run_harvest, Coordinator, Fetcher, Harvest};
use product_harvester::HarvestError;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An HTML response
fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

fn product_page(name: &str, price: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="title">{}</h1>
        <span class="price">{}</span>
        </body></html>"#,
        name, price
    )
}

fn listing_page(product_paths: &[&str], pagination: &[&str]) -> String {
    let cards: String = product_paths
        .iter()
        .map(|p| format!(r#"<div class="card"><a href="{}">view</a></div>"#, p))
        .collect();
    let pages: String = pagination
        .iter()
        .map(|p| format!(r#"<a href="{}">page</a>"#, p))
        .collect();
    format!(
        r#"<html><body>{}<nav class="pagination">{}</nav></body></html>"#,
        cards, pages
    )
}

fn fast_fetch() -> FetchConfig {
    FetchConfig {
        timeout_secs: 5,
        connect_timeout_secs: 2,
        max_retries: 2,
        retry_backoff_ms: 10,
        ..FetchConfig::default()
    }
}

/// Builds a site from JSON, the way a `sites_config.json` entry looks
fn site(seeds: &[String], extra: serde_json::Value, output: &Path) -> SiteProfile {
    let mut value = serde_json::json!({
        "url": seeds,
        "link_tag": ".card",
        "fields": {"name": ".title", "price": ".price"},
        "filename": output.to_string_lossy(),
    });
    if let (Some(target), Some(extra)) = (value.as_object_mut(), extra.as_object()) {
        for (key, v) in extra {
            target.insert(key.clone(), v.clone());
        }
    }
    let config: SiteConfig = serde_json::from_value(value).expect("valid site config");
    SiteProfile::compile("test-shop", &config).expect("site compiles")
}

async fn harvest(profile: SiteProfile) -> Harvest {
    let fetcher = Fetcher::new(&fast_fetch()).expect("client builds");
    Coordinator::new(profile, fetcher)
        .run(&CancellationToken::new())
        .await
        .expect("harvest succeeds")
}

async fn mount_product(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_single_page_site_without_images() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("catalog.json");

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(
            &["/products/a", "/products/b", "/products/c"],
            &["/collections/all/page/2"],
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("Malbec", "$10")).await;
    mount_product(&server, "/products/b", product_page("Syrah", "$12")).await;
    mount_product(&server, "/products/c", product_page("Merlot", "$9")).await;

    // No pagination selector: the page 2 link must never be followed
    Mock::given(method("GET"))
        .and(path("/collections/all/page/2"))
        .respond_with(html(listing_page(&[], &[])))
        .expect(0)
        .mount(&server)
        .await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({}),
        &output,
    );
    let report = run_harvest(profile, &fast_fetch(), &CancellationToken::new())
        .await
        .expect("harvest succeeds");

    assert_eq!(report.listing_pages, 1);
    assert_eq!(report.products_scraped, 3);
    assert!(report.is_clean());

    let written = std::fs::read_to_string(&output).unwrap();
    let catalog: serde_json::Value = serde_json::from_str(&written).unwrap();
    let entries = catalog.as_array().unwrap();
    assert_eq!(entries.len(), 3);

    for entry in entries {
        let product = entry["product"].as_object().unwrap();
        let mut keys: Vec<&str> = product.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["name", "price", "url"]);
    }
    assert_eq!(entries[0]["product"]["name"], "Malbec");
    assert_eq!(
        entries[0]["product"]["url"],
        format!("{}/products/a", base).as_str()
    );
    assert_eq!(entries[2]["product"]["price"], "$9");

    // Keys are written in configured order, then url
    let name_at = written.find("\"name\"").unwrap();
    let price_at = written.find("\"price\"").unwrap();
    let url_at = written.find("\"url\"").unwrap();
    assert!(name_at < price_at && price_at < url_at);
}

#[tokio::test]
async fn test_pagination_back_to_first_page_stops() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(
            &["/products/a", "/products/b"],
            &["/collections/all", "/collections/all/page/2"],
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/all/page/2"))
        .respond_with(html(listing_page(
            &["/products/c"],
            &["/collections/all/page/2", "/collections/all"],
        )))
        .expect(1)
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("A", "1")).await;
    mount_product(&server, "/products/b", product_page("B", "2")).await;
    mount_product(&server, "/products/c", product_page("C", "3")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({"pagination": ".pagination"}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.report.listing_pages, 2);
    assert_eq!(harvest.catalog.len(), 3);
    let names: Vec<&str> = harvest
        .catalog
        .iter()
        .map(|entry| entry.product.field("name").unwrap())
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}

fn names(harvest: &Harvest) -> Vec<&str> {
    harvest
        .catalog
        .iter()
        .map(|entry| entry.product.field("name").unwrap())
        .collect()
}

fn redirect_to(location: String) -> ResponseTemplate {
    ResponseTemplate::new(301).insert_header("Location", location.as_str())
}

#[tokio::test]
async fn test_redirected_seed_is_not_visited_twice() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(redirect_to(format!("{}/collections/all/", base)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/all/"))
        .respond_with(html(listing_page(&["/products/a"], &["/collections/all/page/2"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/all/page/2"))
        .respond_with(html(listing_page(&["/products/b"], &["/collections/all/"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("A", "1")).await;
    mount_product(&server, "/products/b", product_page("B", "2")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({"pagination": ".pagination"}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.report.listing_pages, 2);
    assert_eq!(names(&harvest), vec!["A", "B"]);
    assert!(harvest.report.is_clean());
}

#[tokio::test]
async fn test_next_page_redirecting_to_visited_page_stops() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(&["/products/a"], &["/collections/all/page/2"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/all/page/2"))
        .respond_with(html(listing_page(&["/products/b"], &["/shop"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shop"))
        .respond_with(redirect_to(format!("{}/collections/all", base)))
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("A", "1")).await;
    mount_product(&server, "/products/b", product_page("B", "2")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({"pagination": ".pagination"}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.report.listing_pages, 2);
    assert_eq!(names(&harvest), vec!["A", "B"]);
}

#[tokio::test]
async fn test_back_link_with_different_spelling_stops() {
    let server = MockServer::start().await;
    let base = server.uri();
    let shouted = format!("{}/collections/all", base.replacen("http://", "HTTP://", 1));

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(&["/products/a"], &["/collections/all/page/2"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/collections/all/page/2"))
        .respond_with(html(listing_page(&["/products/b"], &[shouted.as_str()])))
        .expect(1)
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("A", "1")).await;
    mount_product(&server, "/products/b", product_page("B", "2")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({"pagination": ".pagination"}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.report.listing_pages, 2);
    assert_eq!(names(&harvest), vec!["A", "B"]);
}

#[tokio::test]
async fn test_next_page_pointing_to_itself_stops() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(&["/products/a"], &["/collections/all"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("A", "1")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({"pagination": ".pagination"}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.report.listing_pages, 1);
    assert_eq!(harvest.catalog.len(), 1);
}

#[tokio::test]
async fn test_missing_field_and_failed_product_do_not_stop_the_page() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(
            &["/products/a", "/products/b", "/products/c"],
            &[],
        )))
        .mount(&server)
        .await;
    // No .price element on this page
    mount_product(
        &server,
        "/products/a",
        r#"<html><body><h1 class="title">No Price</h1></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/products/b"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_product(&server, "/products/c", product_page("Last", "$5")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.catalog.len(), 2);

    let first = &harvest.catalog[0].product;
    assert_eq!(first.field("name"), Some("No Price"));
    assert_eq!(first.field("price"), Some(""));
    assert_eq!(first.url(), format!("{}/products/a", base));

    let last = &harvest.catalog[1].product;
    assert_eq!(last.field("name"), Some("Last"));

    assert_eq!(harvest.report.products_failed.len(), 1);
    assert_eq!(
        harvest.report.products_failed[0].url,
        format!("{}/products/b", base)
    );
}

#[tokio::test]
async fn test_image_collection_stops_at_element_without_source() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(
            r#"<html><body>
            <div class="card"><a href="/products/a"><img class="thumb" src="/thumbs/a.jpg"></a></div>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    mount_product(
        &server,
        "/products/a",
        r#"<html><body>
        <h1 class="title">Gallery</h1>
        <div class="slide"><img data-src="/img/1.jpg"></div>
        <div class="slide"><a href="/img/2.jpg"><img src="/img/2-small.jpg"></a></div>
        <div class="slide"><img src="/img/3.jpg"></div>
        <div class="slide"><img data-src="/img/4.jpg"></div>
        </body></html>"#
            .to_string(),
    )
    .await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({"image_tag": ".slide img", "thumbnail_tag": "img.thumb"}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    let images: Vec<&str> = harvest.catalog[0]
        .product
        .images()
        .unwrap()
        .iter()
        .map(|image| image.url())
        .collect();
    assert_eq!(
        images,
        vec![
            format!("{}/thumbs/a.jpg", base),
            format!("{}/img/1.jpg", base),
            format!("{}/img/2.jpg", base),
        ]
    );
}

#[tokio::test]
async fn test_listing_failure_aborts_only_its_seed() {
    let server = MockServer::start().await;
    let base = server.uri();

    // First attempt plus two retries
    Mock::given(method("GET"))
        .and(path("/broken/all"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/working/all"))
        .respond_with(html(listing_page(&["/products/a"], &[])))
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("A", "1")).await;

    let profile = site(
        &[format!("{}/broken/all", base), format!("{}/working/all", base)],
        serde_json::json!({}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.catalog.len(), 1);
    assert_eq!(harvest.report.seeds_completed, 1);
    assert_eq!(harvest.report.seeds_aborted.len(), 1);
    assert_eq!(
        harvest.report.seeds_aborted[0].seed,
        format!("{}/broken/all", base)
    );
}

#[tokio::test]
async fn test_transient_product_failure_is_retried() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(&["/products/a"], &[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/a"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("Eventually", "$1")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.catalog.len(), 1);
    assert_eq!(harvest.catalog[0].product.field("name"), Some("Eventually"));
    assert!(harvest.report.is_clean());
}

#[tokio::test]
async fn test_non_html_product_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(&["/products/a", "/products/b"], &[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/products/a"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF-1.4", "application/pdf"))
        .mount(&server)
        .await;
    mount_product(&server, "/products/b", product_page("B", "2")).await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({}),
        Path::new("unused.json"),
    );
    let harvest = harvest(profile).await;

    assert_eq!(harvest.catalog.len(), 1);
    assert_eq!(harvest.report.products_failed.len(), 1);
    assert!(harvest.report.products_failed[0]
        .message
        .contains("Expected HTML"));
}

#[tokio::test]
async fn test_cancelled_run_writes_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out_dir = tempfile::tempdir().unwrap();
    let output = out_dir.path().join("catalog.json");

    Mock::given(method("GET"))
        .respond_with(html(listing_page(&["/products/a"], &[])))
        .expect(0)
        .mount(&server)
        .await;

    let profile = site(
        &[format!("{}/collections/all", base)],
        serde_json::json!({}),
        &output,
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = run_harvest(profile, &fast_fetch(), &cancel).await;
    assert!(matches!(result, Err(HarvestError::Cancelled)));
    assert!(!output.exists());
}

#[tokio::test]
async fn test_repeated_runs_produce_identical_output() {
    let server = MockServer::start().await;
    let base = server.uri();
    let out_dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .respond_with(html(listing_page(&["/products/a", "/products/b"], &[])))
        .mount(&server)
        .await;
    mount_product(&server, "/products/a", product_page("A", "1")).await;
    mount_product(&server, "/products/b", product_page("B", "2")).await;

    let mut outputs = Vec::new();
    for run in 0..2 {
        let output = out_dir.path().join(format!("run-{}.json", run));
        let profile = site(
            &[format!("{}/collections/all", base)],
            serde_json::json!({"image_tag": "img.none"}),
            &output,
        );
        run_harvest(profile, &fast_fetch(), &CancellationToken::new())
            .await
            .expect("harvest succeeds");
        outputs.push(std::fs::read(&output).unwrap());
    }

    assert_eq!(outputs[0], outputs[1]);

    // An image selector with no matches still yields an (empty) images list
    let catalog: serde_json::Value = serde_json::from_slice(&outputs[0]).unwrap();
    assert_eq!(catalog[0]["product"]["images"], serde_json::json!([]));
}
