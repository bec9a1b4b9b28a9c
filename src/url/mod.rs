//! URL scoping and path mapping
//!
//! This module decides which discovered URLs belong to the crawl (same
//! domain, same base path, HTML-like) and maps URLs to output file paths.

use url::Url;

/// File extensions that never hold crawlable HTML
const EXTENSIONS_TO_AVOID: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".pdf", ".zip", ".js", ".css", ".woff", ".woff2",
];

/// Checks whether a URL is in scope for the crawl
///
/// A URL is in scope when its host matches `base_domain`, its path starts
/// with `base_path`, and it does not end in a known non-HTML extension.
pub fn is_in_scope(url: &str, base_domain: &str, base_path: &str) -> bool {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(_) => return false,
    };

    if netloc_of(&parsed).as_deref().unwrap_or("") != base_domain {
        tracing::trace!("Skipping external domain: {}", url);
        return false;
    }

    if !parsed.path().starts_with(base_path) {
        tracing::trace!("Skipping outside base path: {}", url);
        return false;
    }

    let path_lower = parsed.path().to_lowercase();
    if EXTENSIONS_TO_AVOID.iter().any(|ext| path_lower.ends_with(ext)) {
        tracing::trace!("Skipping non-HTML file: {}", url);
        return false;
    }

    true
}

/// Converts a URL to a backend-relative Markdown file path
///
/// Strips `base_path` from the URL path, maps trailing slashes and empty
/// paths to `index`, and ensures a `.md` extension.
pub fn url_to_filepath(url: &str, base_path: &str) -> String {
    let path = Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string());

    let mut path = path
        .strip_prefix(base_path)
        .map(str::to_string)
        .unwrap_or(path);

    if path.ends_with('/') {
        path.push_str("index");
    }

    let mut path = path.trim_start_matches('/').to_string();

    if path.is_empty() {
        path = "index".to_string();
    }

    if !path.ends_with(".md") {
        path.push_str(".md");
    }

    path
}

/// Extracts the host (including any explicit port) of a URL
///
/// The port is kept so that two servers on the same host are not conflated
/// into one crawl scope.
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| netloc_of(&u))
}

fn netloc_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}:{}", host, port)),
        None => Some(host.to_string()),
    }
}

/// Extracts the scheme+host origin of a URL, e.g. `https://example.com`
pub fn extract_origin(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}", parsed.scheme(), host)),
    }
}
