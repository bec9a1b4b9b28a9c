//! Main-content selection and title derivation
//!
//! The selector priority list is tuned for common documentation site
//! generators (Sphinx, MkDocs, GitBook, Docusaurus and similar). It is data,
//! not logic, so new site shapes only need another entry.

use scraper::{ElementRef, Html, Selector};

/// Structural selectors tried in order; first match wins
const CONTENT_SELECTORS: &[&str] = &[
    "main",
    "article",
    "div.content",
    "div.documentation",
    "div.document",
    "div.docs-content",
    "div.doc-content",
    "div#content",
    "div#documentation",
    "div#main-content",
    "div#docs-content",
    "div.sphinx-content",
    "div.md-content",
    "div.page-inner",
    "div.markdown-section",
    "div.section",
    "div.post-content",
    "div.container",
    "div.wrapper",
    "div.entry-content",
    r#"div[role="main"]"#,
];

/// Selects the main content subtree of a document
///
/// Falls through the priority selectors, then a loose scan for any `div`
/// whose class or id contains "content" or "doc", then the whole body.
pub fn select_content(document: &Html) -> Option<ElementRef<'_>> {
    for raw in CONTENT_SELECTORS {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(el) = document.select(&selector).next() {
                return Some(el);
            }
        }
    }

    if let Ok(divs) = Selector::parse("div") {
        for el in document.select(&divs) {
            let value = el.value();
            let haystack = format!(
                "{} {}",
                value.attr("class").unwrap_or(""),
                value.attr("id").unwrap_or("")
            )
            .to_lowercase();
            if haystack.contains("content") || haystack.contains("doc") {
                return Some(el);
            }
        }
    }

    Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
}

/// Gets the raw document title, defaulting to "Untitled Page"
pub fn page_title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled Page".to_string())
}

/// Strips site-branding boilerplate from a title
///
/// Text after the first " | " or " - " separator is assumed to be the site
/// name and dropped.
pub fn short_title(title: &str) -> String {
    if let Some((head, _)) = title.split_once(" | ") {
        head.trim().to_string()
    } else if let Some((head, _)) = title.split_once(" - ") {
        head.trim().to_string()
    } else {
        title.trim().to_string()
    }
}
