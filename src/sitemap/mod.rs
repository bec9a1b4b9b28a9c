//! Sitemap resolution
//!
//! Resolves a sitemap URL into a flat list of page URLs, following nested
//! sitemap indexes. Recursion is bounded by a depth limit and a visited set,
//! so self-referencing sitemaps terminate. Namespaced and non-namespaced
//! sitemap XML are both accepted.

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use std::collections::{HashSet, VecDeque};

/// Maximum nesting depth for sitemap indexes
pub const SITEMAP_MAX_DEPTH: u32 = 10;

/// The two recognized sitemap document shapes
#[derive(Debug, PartialEq, Eq)]
enum SitemapDoc {
    /// Leaf list of page URLs
    UrlSet(Vec<String>),
    /// List of nested sitemap URLs
    Index(Vec<String>),
    /// Root element was neither urlset nor sitemapindex
    Unknown,
}

/// Resolves sitemap URLs into page URL lists
pub struct SitemapResolver {
    client: Client,
    max_depth: u32,
}

impl SitemapResolver {
    /// Creates a resolver fetching with the given client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_depth: SITEMAP_MAX_DEPTH,
        }
    }

    /// Returns true if a seed URL looks like a sitemap
    pub fn looks_like_sitemap(url: &str) -> bool {
        let lower = url.to_lowercase();
        lower.ends_with(".xml") || lower.contains("sitemap")
    }

    /// Resolves a sitemap (or sitemap index) into a deduplicated page URL list
    ///
    /// Fetch or parse failures at any level contribute zero URLs from that
    /// node without aborting the rest of the resolution.
    pub async fn resolve(&self, sitemap_url: &str) -> Vec<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut seen_pages: HashSet<String> = HashSet::new();
        let mut pages: Vec<String> = Vec::new();
        let mut work: VecDeque<(String, u32)> = VecDeque::new();
        work.push_back((sitemap_url.to_string(), 0));

        while let Some((url, depth)) = work.pop_front() {
            if depth >= self.max_depth {
                tracing::warn!("Maximum sitemap depth reached at {}", url);
                continue;
            }

            if !visited.insert(url.clone()) {
                tracing::warn!("Circular sitemap reference detected: {}", url);
                continue;
            }

            tracing::info!("Fetching sitemap: {}", url);
            let xml = match self.fetch(&url).await {
                Some(body) => body,
                None => continue,
            };

            match parse_sitemap(&xml) {
                SitemapDoc::UrlSet(urls) => {
                    for page in urls {
                        if seen_pages.insert(page.clone()) {
                            pages.push(page);
                        }
                    }
                }
                SitemapDoc::Index(children) => {
                    for child in children {
                        work.push_back((child, depth + 1));
                    }
                }
                SitemapDoc::Unknown => {
                    tracing::warn!("Unknown sitemap format at {}", url);
                }
            }
        }

        pages
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => Some(body),
                Err(e) => {
                    tracing::error!("Error reading sitemap {}: {}", url, e);
                    None
                }
            },
            Ok(response) => {
                tracing::error!("Sitemap {} returned HTTP {}", url, response.status().as_u16());
                None
            }
            Err(e) => {
                tracing::error!("Error fetching sitemap {}: {}", url, e);
                None
            }
        }
    }
}

/// Parses a sitemap document, classifying it by its root element
///
/// Only the local element names matter; the sitemap namespace prefix is
/// optional. Malformed XML yields `Unknown` with no URLs.
fn parse_sitemap(xml: &str) -> SitemapDoc {
    let mut reader = Reader::from_str(xml);

    let mut root: Option<Vec<u8>> = None;
    let mut in_loc = false;
    let mut current = String::new();
    let mut locs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if root.is_none() {
                    root = Some(name.clone());
                }
                if name == b"loc" {
                    in_loc = true;
                    current.clear();
                }
            }
            Ok(Event::Text(t)) if in_loc => {
                if let Ok(text) = t.unescape() {
                    current.push_str(&text);
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                    let url = current.trim().to_string();
                    if !url.is_empty() {
                        locs.push(url);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!("XML parse error in sitemap: {}", e);
                return SitemapDoc::Unknown;
            }
        }
    }

    match root.as_deref() {
        Some(b"urlset") => SitemapDoc::UrlSet(locs),
        Some(b"sitemapindex") => SitemapDoc::Index(locs),
        _ => SitemapDoc::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://e.com/a</loc></url>
  <url><loc>https://e.com/b</loc></url>
</urlset>"#;

    #[test]
    fn test_parse_namespaced_urlset() {
        let doc = parse_sitemap(URLSET);
        assert_eq!(
            doc,
            SitemapDoc::UrlSet(vec![
                "https://e.com/a".to_string(),
                "https://e.com/b".to_string()
            ])
        );
    }

    #[test]
    fn test_parse_plain_urlset() {
        let xml = "<urlset><url><loc>https://e.com/x</loc></url></urlset>";
        assert_eq!(
            parse_sitemap(xml),
            SitemapDoc::UrlSet(vec!["https://e.com/x".to_string()])
        );
    }

    #[test]
    fn test_parse_sitemapindex() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://e.com/sub.xml</loc></sitemap>
</sitemapindex>"#;
        assert_eq!(
            parse_sitemap(xml),
            SitemapDoc::Index(vec!["https://e.com/sub.xml".to_string()])
        );
    }

    #[test]
    fn test_parse_malformed_xml() {
        assert_eq!(parse_sitemap("<urlset><url><loc>x</urlset>"), SitemapDoc::Unknown);
        assert_eq!(parse_sitemap("not xml at all"), SitemapDoc::Unknown);
    }

    #[test]
    fn test_looks_like_sitemap() {
        assert!(SitemapResolver::looks_like_sitemap("https://e.com/sitemap.xml"));
        assert!(SitemapResolver::looks_like_sitemap("https://e.com/Sitemap_index.xml"));
        assert!(SitemapResolver::looks_like_sitemap("https://e.com/sitemap"));
        assert!(!SitemapResolver::looks_like_sitemap("https://e.com/docs/"));
    }

    #[tokio::test]
    async fn test_resolve_urlset() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(URLSET))
            .mount(&server)
            .await;

        let resolver = SitemapResolver::new(Client::new());
        let urls = resolver.resolve(&format!("{}/sitemap.xml", server.uri())).await;
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"https://e.com/a".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_nested_index() {
        let server = MockServer::start().await;
        let index = format!(
            "<sitemapindex><sitemap><loc>{}/sub.xml</loc></sitemap></sitemapindex>",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/sub.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(URLSET))
            .mount(&server)
            .await;

        let resolver = SitemapResolver::new(Client::new());
        let urls = resolver.resolve(&format!("{}/sitemap.xml", server.uri())).await;
        assert_eq!(urls.len(), 2);
    }

    #[tokio::test]
    async fn test_self_referencing_index_terminates() {
        let server = MockServer::start().await;
        let index = format!(
            "<sitemapindex><sitemap><loc>{}/sitemap.xml</loc></sitemap></sitemapindex>",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;

        let resolver = SitemapResolver::new(Client::new());
        let urls = resolver.resolve(&format!("{}/sitemap.xml", server.uri())).await;
        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_child_does_not_abort_resolution() {
        let server = MockServer::start().await;
        let index = format!(
            "<sitemapindex><sitemap><loc>{0}/bad.xml</loc></sitemap><sitemap><loc>{0}/good.xml</loc></sitemap></sitemapindex>",
            server.uri()
        );
        Mock::given(method("GET"))
            .and(path("/sitemap.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/bad.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<<<not xml"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/good.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(URLSET))
            .mount(&server)
            .await;

        let resolver = SitemapResolver::new(Client::new());
        let urls = resolver.resolve(&format!("{}/sitemap.xml", server.uri())).await;
        assert_eq!(urls.len(), 2);
    }
}
