//! HTML to Markdown conversion
//!
//! The converter selects the main content of a page, builds an immutable
//! block/inline representation of it, renders that to Markdown, and
//! normalizes the result. A panic anywhere in the structured pipeline
//! degrades to a minimal text-only conversion instead of failing the page.

mod extract;
mod ir;
mod links;
mod postprocess;
mod render;

use chrono::Utc;
use scraper::{ElementRef, Html, Node};
use serde::Deserialize;
use std::panic::{catch_unwind, AssertUnwindSafe};
use url::Url;

/// Per-crawl conversion configuration, immutable during the crawl
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ConvertOptions {
    /// Render links as bare text
    pub ignore_links: bool,

    /// Drop images entirely
    pub ignore_images: bool,

    /// Wrap paragraph text at this column (0 = no wrapping)
    pub body_width: usize,

    /// Use `-` instead of `*` for unordered list items
    pub dash_unordered_list: bool,

    /// Replace same-site and root-relative links with their bare text
    pub skip_internal_links: bool,

    /// Escape Markdown metacharacters appearing in plain text
    pub escape_snob: bool,

    /// Allow wrapping of lines that contain links
    pub wrap_links: bool,

    /// Interpret Google Docs export styling (bold/italic spans)
    pub google_doc: bool,

    /// Drop struck-through text instead of rendering `~~text~~`
    pub hide_strikethrough: bool,

    /// Base URL overriding the page URL for link resolution
    pub base_url: Option<String>,

    /// Combined-output mode: suppresses the synthesized per-page title
    pub single_file: bool,

    /// Prepend a YAML frontmatter block instead of an H1 title
    pub include_frontmatter: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            ignore_links: false,
            ignore_images: false,
            body_width: 0,
            dash_unordered_list: false,
            skip_internal_links: false,
            escape_snob: false,
            wrap_links: true,
            google_doc: false,
            hide_strikethrough: false,
            base_url: None,
            single_file: false,
            include_frontmatter: false,
        }
    }
}

/// Converts HTML pages to Markdown and extracts their outbound links
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    options: ConvertOptions,
}

impl MarkdownConverter {
    /// Creates a converter with the given options
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Extracts the main content of a page as Markdown
    ///
    /// Running this twice on the same input yields identical output. If the
    /// structured pipeline panics on pathological input, the page degrades
    /// to the simple fallback conversion.
    pub fn extract_text(&self, html: &str, url: &str) -> String {
        match catch_unwind(AssertUnwindSafe(|| self.convert(html, url))) {
            Ok(markdown) => markdown,
            Err(_) => {
                tracing::error!("Structured conversion failed for {}, using fallback", url);
                simple_fallback(html)
            }
        }
    }

    fn convert(&self, html: &str, url: &str) -> String {
        let document = Html::parse_document(html);
        let title = extract::short_title(&extract::page_title(&document));

        let content = match extract::select_content(&document) {
            Some(el) => el,
            None => {
                return format!(
                    "# {}\n\nNo main content could be extracted from this page.",
                    title
                )
            }
        };

        let base = self
            .options
            .base_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok())
            .or_else(|| Url::parse(url).ok());

        let blocks = ir::build_blocks(content, &self.options, base.as_ref());
        let rendered = render::render_blocks(&blocks, &self.options);
        let body = postprocess::normalize(&rendered, &self.options);

        if self.options.include_frontmatter {
            format!(
                "---\ntitle: {}\nsource: {}\ndate: {}\n---\n\n{}",
                title,
                url,
                Utc::now().format("%Y-%m-%d"),
                body
            )
        } else if self.options.single_file || body.starts_with("# ") {
            // Combined output gets a per-page "# Source:" header from the
            // crawler, so no synthesized title here
            body
        } else {
            format!("# {}\n\n{}", title, body)
        }
    }

    /// Extracts crawlable links, filtered by the caller's validity predicate
    pub fn extract_links<F>(&self, html: &str, current_url: &str, is_valid: F) -> Vec<String>
    where
        F: Fn(&str) -> bool,
    {
        links::extract_links(html, current_url, is_valid)
    }
}

/// Minimal conversion used when the structured pipeline fails
///
/// Strips script/style, takes the title and the raw text content.
fn simple_fallback(html: &str) -> String {
    let document = Html::parse_document(html);
    let title = extract::page_title(&document);

    let mut text = String::new();
    collect_text(document.root_element(), &mut text);

    let mut collapsed = String::with_capacity(text.len());
    let mut blank_lines = 0usize;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            blank_lines += 1;
            if blank_lines > 1 {
                continue;
            }
        } else {
            blank_lines = 0;
        }
        collapsed.push_str(line);
        collapsed.push('\n');
    }

    format!("# {}\n\n{}", title, collapsed.trim())
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                let trimmed = t.text.trim();
                if !trimmed.is_empty() {
                    out.push_str(trimmed);
                    out.push('\n');
                }
            }
            Node::Element(element) => {
                if matches!(element.name(), "script" | "style" | "title" | "noscript") {
                    continue;
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> MarkdownConverter {
        MarkdownConverter::new(ConvertOptions::default())
    }

    #[test]
    fn test_basic_page_conversion() {
        let html = r#"<html><head><title>T</title></head><body><main><h1>H</h1><p>Hi <a href="/x">x</a></p></main></body></html>"#;
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.starts_with("# H"), "got: {}", md);
        assert!(md.contains("Hi [x](https://e.com/x)"), "got: {}", md);
    }

    #[test]
    fn test_title_prepended_when_content_has_no_h1() {
        let html = r#"<html><head><title>Guide | Site</title></head><body><main><p>text</p></main></body></html>"#;
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.starts_with("# Guide\n\n"), "got: {}", md);
    }

    #[test]
    fn test_ordered_list_start() {
        let html = r#"<html><body><main><ol start="3"><li>a</li><li>b</li></ol></main></body></html>"#;
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.contains("3. a"), "got: {}", md);
        assert!(md.contains("4. b"), "got: {}", md);
    }

    #[test]
    fn test_table_padded_to_header_width() {
        let html = r#"<html><body><main><table>
            <thead><tr><th>A</th><th>B</th></tr></thead>
            <tbody><tr><td>1</td><td>2</td><td>3</td></tr></tbody>
        </table></main></body></html>"#;
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.contains("| A | B |"), "got: {}", md);
        assert!(md.contains("| --- | --- |"), "got: {}", md);
        assert!(md.contains("| 1 | 2 |"), "got: {}", md);
        assert!(!md.contains("| 1 | 2 | 3 |"), "got: {}", md);
    }

    #[test]
    fn test_code_block_survives_reflow() {
        let html = r#"<html><body><main><pre><code class="language-rust">fn main() {
    body();
}</code></pre></main></body></html>"#;
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.contains("```rust\nfn main() {\n    body();\n}\n```"), "got: {}", md);
    }

    #[test]
    fn test_conversion_is_idempotent_per_input() {
        let html = r#"<html><head><title>T</title></head><body><main><h2>A</h2><p>one</p><ul><li>x</li></ul></main></body></html>"#;
        let first = converter().extract_text(html, "https://e.com/");
        let second = converter().extract_text(html, "https://e.com/");
        assert_eq!(first, second);
    }

    #[test]
    fn test_frontmatter_mode() {
        let options = ConvertOptions {
            include_frontmatter: true,
            ..ConvertOptions::default()
        };
        let html = r#"<html><head><title>Guide</title></head><body><main><p>text</p></main></body></html>"#;
        let md = MarkdownConverter::new(options).extract_text(html, "https://e.com/guide");
        assert!(md.starts_with("---\ntitle: Guide\nsource: https://e.com/guide\ndate: "));
        assert!(!md.contains("# Guide"), "got: {}", md);
    }

    #[test]
    fn test_single_file_mode_skips_synthesized_title() {
        let options = ConvertOptions {
            single_file: true,
            ..ConvertOptions::default()
        };
        let html = r#"<html><head><title>Guide</title></head><body><main><p>text</p></main></body></html>"#;
        let md = MarkdownConverter::new(options).extract_text(html, "https://e.com/");
        assert!(!md.contains("# Guide"), "got: {}", md);
        assert!(md.contains("text"));
    }

    #[test]
    fn test_ignore_links_renders_bare_text() {
        let options = ConvertOptions {
            ignore_links: true,
            ..ConvertOptions::default()
        };
        let html = r#"<html><body><main><p>see <a href="/x">docs</a></p></main></body></html>"#;
        let md = MarkdownConverter::new(options).extract_text(html, "https://e.com/");
        assert!(md.contains("see docs"), "got: {}", md);
        assert!(!md.contains("]("), "got: {}", md);
    }

    #[test]
    fn test_ignore_images() {
        let options = ConvertOptions {
            ignore_images: true,
            ..ConvertOptions::default()
        };
        let html = r#"<html><body><main><p>a <img src="x.png" alt="pic"> b</p></main></body></html>"#;
        let md = MarkdownConverter::new(options).extract_text(html, "https://e.com/");
        assert!(!md.contains("!["), "got: {}", md);
    }

    #[test]
    fn test_image_markdown() {
        let html = r#"<html><body><main><p><img src="/img/x.png" alt="a (small) pic"></p></main></body></html>"#;
        let md = converter().extract_text(html, "https://e.com/");
        assert!(
            md.contains("![a \\(small\\) pic](https://e.com/img/x.png)"),
            "got: {}",
            md
        );
    }

    #[test]
    fn test_blockquote_rendering() {
        let html = "<html><body><main><blockquote><p>wise words</p></blockquote></main></body></html>";
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.contains("> wise words"), "got: {}", md);
    }

    #[test]
    fn test_multi_paragraph_blockquote() {
        let html =
            "<html><body><main><blockquote><p>one</p><p>two</p></blockquote></main></body></html>";
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.contains("> one\n>\n> two"), "got: {}", md);
    }

    #[test]
    fn test_horizontal_rule() {
        let html = "<html><body><main><p>a</p><hr><p>b</p></main></body></html>";
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.contains("\n\n---\n\n"), "got: {}", md);
    }

    #[test]
    fn test_simple_fallback_strips_scripts() {
        let html = r#"<html><head><title>T</title><script>evil()</script></head><body><p>visible</p></body></html>"#;
        let md = simple_fallback(html);
        assert!(md.starts_with("# T\n\n"));
        assert!(md.contains("visible"));
        assert!(!md.contains("evil"));
    }

    #[test]
    fn test_navigation_boilerplate_removed() {
        let html = r#"<html><body><nav><a href="/">Home</a></nav><main><p>real content</p></main><footer>foot</footer></body></html>"#;
        let md = converter().extract_text(html, "https://e.com/");
        assert!(md.contains("real content"));
        assert!(!md.contains("foot"), "got: {}", md);
    }
}
