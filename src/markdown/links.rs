//! Outbound link extraction for frontier discovery

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts crawlable links from a page
///
/// Fragment-only, `javascript:`, `mailto:`, and `tel:` targets are skipped;
/// relative hrefs are resolved against `current_url`; fragments are stripped
/// so the same page reached via different anchors counts once; the result is
/// deduplicated and filtered by the caller's validity predicate.
pub fn extract_links<F>(html: &str, current_url: &str, is_valid: F) -> Vec<String>
where
    F: Fn(&str) -> bool,
{
    let base = match Url::parse(current_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot resolve links against {}: {}", current_url, e);
            return Vec::new();
        }
    };

    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(href) => href.trim(),
            None => continue,
        };

        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
            || href.starts_with("tel:")
        {
            continue;
        }

        let mut resolved = match base.join(href) {
            Ok(url) => url,
            Err(_) => continue,
        };
        resolved.set_fragment(None);
        let resolved = resolved.to_string();

        if !is_valid(&resolved) {
            continue;
        }
        if seen.insert(resolved.clone()) {
            links.push(resolved);
        }
    }

    links
}
