//! End-to-end crawl tests against a mock HTTP server

use docmark::{Config, CrawlEngine};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!(
            "<html><head><title>{}</title></head><body><main>{}</main></body></html>",
            title, body
        ),
        "text/html; charset=utf-8",
    )
}

fn test_config(url: &str, dir: &TempDir) -> Config {
    let mut config = Config::new(url);
    config.crawl.delay = 0.0;
    config.storage.output = dir.path().to_string_lossy().into_owned();
    config
}

#[tokio::test]
async fn test_breadth_first_crawl_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Root",
            r#"<p><a href="/b">b</a> <a href="/c">c</a></p>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("B", r#"<p><a href="/d">d</a></p>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c"))
        .respond_with(html_page("C", "<p>leaf</p>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/d"))
        .respond_with(html_page("D", "<p>leaf</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();

    let order: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let collected = Arc::clone(&order);
    engine.on_page_crawled(move |url, _count| {
        collected.lock().unwrap().push(url.to_string());
    });

    let stats = engine.crawl().await.unwrap();
    assert_eq!(stats.pages_processed, 4);
    assert_eq!(stats.pages_failed, 0);

    // Siblings of the root come before the grandchild
    let order = order.lock().unwrap();
    let paths: Vec<&str> = order
        .iter()
        .map(|u| u.rsplit('/').next().unwrap_or(""))
        .collect();
    assert_eq!(paths, vec!["", "b", "c", "d"]);

    assert!(dir.path().join("index.md").exists());
    assert!(dir.path().join("b.md").exists());
    assert!(dir.path().join("d.md").exists());
}

#[tokio::test]
async fn test_pages_saved_as_markdown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Guide",
            r#"<h1>Intro</h1><p>See the <a href="https://other.com/x">reference</a>.</p>"#,
        ))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();
    engine.crawl().await.unwrap();

    let saved = std::fs::read_to_string(dir.path().join("index.md")).unwrap();
    assert!(saved.starts_with("# Intro"), "got: {}", saved);
    assert!(
        saved.contains("[reference](https://other.com/x)"),
        "got: {}",
        saved
    );
}

#[tokio::test]
async fn test_robots_disallow_skips_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Root",
            r#"<p><a href="/private">secret</a> <a href="/public">open</a></p>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html_page("Public", "<p>fine</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html_page("Private", "<p>nope</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();
    let stats = engine.crawl().await.unwrap();

    assert_eq!(stats.pages_processed, 2);
    assert!(!dir.path().join("private.md").exists());
}

#[tokio::test]
async fn test_max_pages_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Root",
            r#"<p><a href="/a">a</a> <a href="/b">b</a> <a href="/c">c</a></p>"#,
        ))
        .mount(&server)
        .await;
    for p in ["/a", "/b", "/c"] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(html_page("Page", "<p>x</p>"))
            .mount(&server)
            .await;
    }

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&format!("{}/", server.uri()), &dir);
    config.crawl.max_pages = 2;
    let mut engine = CrawlEngine::new(config).unwrap();
    let stats = engine.crawl().await.unwrap();

    assert_eq!(stats.pages_processed, 2);
}

#[tokio::test]
async fn test_failed_page_does_not_abort_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Root",
            r#"<p><a href="/gone">gone</a> <a href="/ok">ok</a></p>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html_page("Ok", "<p>still here</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();

    let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let collected = Arc::clone(&errors);
    engine.on_error(move |url, error| {
        assert!(error.is_page_local(), "unexpected error kind: {}", error);
        collected.lock().unwrap().push(url.to_string());
    });

    let stats = engine.crawl().await.unwrap();
    assert_eq!(stats.pages_processed, 2);
    assert_eq!(stats.pages_failed, 1);

    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].ends_with("/gone"));
    assert!(dir.path().join("ok.md").exists());
}

#[tokio::test]
async fn test_non_html_content_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Root", r#"<p><a href="/api">api</a></p>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"k":1}"#, "application/json"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();
    let stats = engine.crawl().await.unwrap();

    // Skipped, not failed; its bytes still count toward the download total
    assert_eq!(stats.pages_processed, 1);
    assert_eq!(stats.pages_failed, 0);
    assert!(stats.bytes_downloaded > 0);
    assert!(!dir.path().join("api.md").exists());
}

#[tokio::test]
async fn test_single_file_mode_appends_sections() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Root", r#"<p>intro <a href="/next">next</a></p>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html_page("Next", "<p>more</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&format!("{}/", server.uri()), &dir);
    config.crawl.single_file = true;
    let mut engine = CrawlEngine::new(config).unwrap();
    engine.crawl().await.unwrap();

    let combined = std::fs::read_to_string(dir.path().join("documentation.md")).unwrap();
    assert!(combined.starts_with("# Documentation Crawl\nStarted: "), "got: {}", combined);
    assert_eq!(combined.matches("\n---\n\n# Source: ").count(), 2);
    assert!(combined.contains("intro"));
    assert!(combined.contains("more"));
    assert!(!dir.path().join("index.md").exists());
    assert!(!dir.path().join("next.md").exists());
}

#[tokio::test]
async fn test_sitemap_seed_enqueues_pages() {
    let server = MockServer::start().await;
    let sitemap = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{uri}/a</loc></url>
  <url><loc>{uri}/b</loc></url>
</urlset>"#,
        uri = server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sitemap, "application/xml"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", "<p>alpha</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("B", "<p>beta</p>"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/sitemap.xml", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();
    let stats = engine.crawl().await.unwrap();

    // The sitemap itself is skipped as non-HTML; both listed pages are saved
    assert_eq!(stats.pages_processed, 2);
    assert!(dir.path().join("a.md").exists());
    assert!(dir.path().join("b.md").exists());
}

#[tokio::test]
async fn test_cyclic_links_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Root", r#"<p><a href="/a">a</a></p>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", r#"<p><a href="/">home</a> <a href="/a">self</a></p>"#))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();
    let stats = engine.crawl().await.unwrap();

    assert_eq!(stats.pages_processed, 2);
}

#[tokio::test]
async fn test_out_of_scope_links_not_followed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/"))
        .respond_with(html_page(
            "Docs",
            r#"<p><a href="/docs/guide">guide</a> <a href="/blog/post">blog</a>
               <a href="/docs/logo.png">logo</a></p>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/guide"))
        .respond_with(html_page("Guide", "<p>in scope</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/blog/post"))
        .respond_with(html_page("Blog", "<p>out of scope</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(&format!("{}/docs/", server.uri()), &dir);
    let mut engine = CrawlEngine::new(config).unwrap();
    let stats = engine.crawl().await.unwrap();

    assert_eq!(stats.pages_processed, 2);
    assert!(dir.path().join("guide.md").exists());
}
