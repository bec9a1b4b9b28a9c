//! Intermediate representation of extracted page content
//!
//! The converter builds an immutable block/inline tree from the selected DOM
//! subtree, then renders it in a second stage. Keeping the two stages apart
//! avoids the ordering hazards of rewriting the DOM in place.

use super::ConvertOptions;
use crate::url::extract_domain;
use scraper::{ElementRef, Node};
use url::Url;

/// Element names dropped entirely during the IR build
const NOISE_TAGS: &[&str] = &[
    "script", "style", "iframe", "nav", "footer", "header", "aside", "noscript", "meta", "button",
    "svg", "canvas",
];

/// Class names marking boilerplate containers
const NOISE_CLASSES: &[&str] = &[
    "navigation",
    "sidebar",
    "menu",
    "ads",
    "banner",
    "cookie-notice",
    "social-links",
];

/// A block-level node of the page content
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Heading with its children collapsed to plain text
    Heading { level: u8, text: String },
    Paragraph(Vec<Inline>),
    List(List),
    Table(Table),
    CodeBlock { language: String, code: String },
    Blockquote(Vec<Block>),
    Rule,
}

/// An ordered or unordered list
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub ordered: bool,
    /// First item number for ordered lists (the `start` attribute)
    pub start: u64,
    pub items: Vec<ListItem>,
}

/// One list item: its own inline content plus any nested lists
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub inlines: Vec<Inline>,
    pub nested: Vec<List>,
}

/// A table; cells hold inline content
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Header cells, when the table declares any
    pub header: Option<Vec<Vec<Inline>>>,
    pub rows: Vec<Vec<Vec<Inline>>>,
}

/// An inline node within a block
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    Code(String),
    Emphasis(Vec<Inline>),
    Strong(Vec<Inline>),
    Strikethrough(Vec<Inline>),
    Link { text: Vec<Inline>, href: String },
    Image { alt: String, src: String },
    LineBreak,
}

struct BuildContext<'a> {
    opts: &'a ConvertOptions,
    base: Option<&'a Url>,
}

/// Builds the block tree for the selected content subtree
pub fn build_blocks(root: ElementRef<'_>, opts: &ConvertOptions, base: Option<&Url>) -> Vec<Block> {
    let ctx = BuildContext { opts, base };
    block_children(root, &ctx)
}

/// Returns true for elements that never contribute content
fn is_noise(el: ElementRef<'_>) -> bool {
    let value = el.value();
    if NOISE_TAGS.contains(&value.name()) {
        return true;
    }
    if value.attr("aria-hidden") == Some("true") {
        return true;
    }
    value.classes().any(|c| NOISE_CLASSES.contains(&c))
}

fn heading_level(name: &str) -> Option<u8> {
    let level: u8 = name.strip_prefix('h')?.parse().ok()?;
    if (1..=6).contains(&level) {
        Some(level)
    } else {
        None
    }
}

/// Plain descendant text with whitespace runs collapsed
fn plain_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    let mut out = String::with_capacity(raw.len());
    let mut last_ws = false;
    for ch in raw.chars() {
        if ch.is_whitespace() {
            if !last_ws {
                out.push(' ');
            }
            last_ws = true;
        } else {
            out.push(ch);
            last_ws = false;
        }
    }
    out.trim().to_string()
}

fn inline_run_is_blank(run: &[Inline]) -> bool {
    run.iter().all(|inline| match inline {
        Inline::Text(t) => t.trim().is_empty(),
        Inline::LineBreak => true,
        _ => false,
    })
}

/// Walks an element's children, producing blocks; loose inline content
/// between block elements is gathered into implicit paragraphs.
fn block_children(el: ElementRef<'_>, ctx: &BuildContext<'_>) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut run: Vec<Inline> = Vec::new();

    let flush = |run: &mut Vec<Inline>, blocks: &mut Vec<Block>| {
        if !inline_run_is_blank(run) {
            blocks.push(Block::Paragraph(std::mem::take(run)));
        } else {
            run.clear();
        }
    };

    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                run.push(Inline::Text(t.text.to_string()));
            }
            Node::Element(_) => {
                let child_el = match ElementRef::wrap(child) {
                    Some(c) => c,
                    None => continue,
                };
                if is_noise(child_el) {
                    continue;
                }
                let name = child_el.value().name();
                if let Some(level) = heading_level(name) {
                    flush(&mut run, &mut blocks);
                    let text = plain_text(child_el);
                    if !text.is_empty() {
                        blocks.push(Block::Heading { level, text });
                    }
                    continue;
                }
                match name {
                    "p" => {
                        flush(&mut run, &mut blocks);
                        let inlines = collect_inlines(child_el, ctx);
                        if !inline_run_is_blank(&inlines) {
                            blocks.push(Block::Paragraph(inlines));
                        }
                    }
                    "ul" | "ol" => {
                        flush(&mut run, &mut blocks);
                        blocks.push(Block::List(build_list(child_el, ctx)));
                    }
                    "table" => {
                        flush(&mut run, &mut blocks);
                        blocks.push(Block::Table(build_table(child_el, ctx)));
                    }
                    "pre" => {
                        flush(&mut run, &mut blocks);
                        blocks.push(build_code_block(child_el));
                    }
                    "blockquote" => {
                        flush(&mut run, &mut blocks);
                        blocks.push(Block::Blockquote(block_children(child_el, ctx)));
                    }
                    "hr" => {
                        flush(&mut run, &mut blocks);
                        blocks.push(Block::Rule);
                    }
                    "br" => run.push(Inline::LineBreak),
                    "div" | "section" | "article" | "main" | "body" | "figure" | "details" => {
                        flush(&mut run, &mut blocks);
                        blocks.extend(block_children(child_el, ctx));
                    }
                    _ => inline_element(child_el, ctx, &mut run),
                }
            }
            _ => {}
        }
    }

    flush(&mut run, &mut blocks);
    blocks
}

/// Gathers the inline content of an element's children
fn collect_inlines(el: ElementRef<'_>, ctx: &BuildContext<'_>) -> Vec<Inline> {
    let mut out = Vec::new();
    for child in el.children() {
        match child.value() {
            Node::Text(t) => out.push(Inline::Text(t.text.to_string())),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_noise(child_el) {
                        inline_element(child_el, ctx, &mut out);
                    }
                }
            }
            _ => {}
        }
    }
    out
}

fn inline_element(el: ElementRef<'_>, ctx: &BuildContext<'_>, out: &mut Vec<Inline>) {
    match el.value().name() {
        "a" => match el.value().attr("href") {
            Some(href) => {
                let raw = href.trim();
                let resolved = resolve_href(raw, ctx.base);
                let text = collect_inlines(el, ctx);
                let internal = raw.starts_with('/') || same_domain(&resolved, ctx.base);
                if ctx.opts.ignore_links || (ctx.opts.skip_internal_links && internal) {
                    out.extend(text);
                } else {
                    out.push(Inline::Link {
                        text,
                        href: resolved,
                    });
                }
            }
            None => out.extend(collect_inlines(el, ctx)),
        },
        "img" => {
            if ctx.opts.ignore_images {
                return;
            }
            if let Some(src) = el.value().attr("src") {
                let alt = el
                    .value()
                    .attr("alt")
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .or_else(|| el.value().attr("title").map(str::trim).filter(|s| !s.is_empty()))
                    .unwrap_or("Image")
                    .to_string();
                out.push(Inline::Image {
                    alt,
                    src: resolve_href(src.trim(), ctx.base),
                });
            }
        }
        "code" | "pre" => out.push(Inline::Code(el.text().collect())),
        "em" | "i" => out.push(Inline::Emphasis(collect_inlines(el, ctx))),
        "strong" | "b" => out.push(Inline::Strong(collect_inlines(el, ctx))),
        "s" | "strike" | "del" => {
            // hide_strikethrough drops struck-through content entirely
            if !ctx.opts.hide_strikethrough {
                out.push(Inline::Strikethrough(collect_inlines(el, ctx)));
            }
        }
        "br" => out.push(Inline::LineBreak),
        "span" if ctx.opts.google_doc => {
            let style = el.value().attr("style").unwrap_or("").replace(' ', "");
            let children = collect_inlines(el, ctx);
            if style.contains("font-weight:700") || style.contains("font-weight:bold") {
                out.push(Inline::Strong(children));
            } else if style.contains("font-style:italic") {
                out.push(Inline::Emphasis(children));
            } else {
                out.extend(children);
            }
        }
        _ => out.extend(collect_inlines(el, ctx)),
    }
}

fn resolve_href(href: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

fn same_domain(url: &str, base: Option<&Url>) -> bool {
    let base_domain = match base.and_then(|b| extract_domain(b.as_str())) {
        Some(d) => d,
        None => return false,
    };
    extract_domain(url).as_deref() == Some(base_domain.as_str())
}

/// Detects a code language from a `language-`, `lang-`, `highlight-`, or
/// `brush:` class.
fn code_language(el: ElementRef<'_>) -> Option<String> {
    for class in el.value().classes() {
        for prefix in ["language-", "lang-", "highlight-"] {
            if let Some(rest) = class.strip_prefix(prefix) {
                if !rest.is_empty() {
                    return Some(rest.to_string());
                }
            }
        }
        if let Some(rest) = class.strip_prefix("brush:") {
            let rest = rest.trim();
            if !rest.is_empty() {
                return Some(rest.to_string());
            }
        }
    }
    None
}

fn build_code_block(pre: ElementRef<'_>) -> Block {
    let code_el = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|c| c.value().name() == "code");

    let language = code_el
        .and_then(code_language)
        .or_else(|| code_language(pre))
        .unwrap_or_default();

    let code: String = match code_el {
        Some(code_el) => code_el.text().collect(),
        None => pre.text().collect(),
    };

    Block::CodeBlock { language, code }
}

fn build_list(el: ElementRef<'_>, ctx: &BuildContext<'_>) -> List {
    let ordered = el.value().name() == "ol";
    let start = el
        .value()
        .attr("start")
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(1);

    let items = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == "li" && !is_noise(*c))
        .map(|li| build_list_item(li, ctx))
        .collect();

    List {
        ordered,
        start,
        items,
    }
}

fn build_list_item(li: ElementRef<'_>, ctx: &BuildContext<'_>) -> ListItem {
    let mut inlines = Vec::new();
    let mut nested = Vec::new();

    for child in li.children() {
        match child.value() {
            Node::Text(t) => inlines.push(Inline::Text(t.text.to_string())),
            Node::Element(_) => {
                let child_el = match ElementRef::wrap(child) {
                    Some(c) => c,
                    None => continue,
                };
                if is_noise(child_el) {
                    continue;
                }
                match child_el.value().name() {
                    "ul" | "ol" => nested.push(build_list(child_el, ctx)),
                    // Block children of an item are flattened into its line
                    "p" | "div" => inlines.extend(collect_inlines(child_el, ctx)),
                    _ => inline_element(child_el, ctx, &mut inlines),
                }
            }
            _ => {}
        }
    }

    ListItem { inlines, nested }
}

fn children_named<'a>(el: ElementRef<'a>, name: &str) -> Vec<ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|c| c.value().name() == name)
        .collect()
}

/// Builds a table, preferring explicit thead/tbody sections
///
/// Without a thead, the first body row is promoted to header only when it
/// holds `th` cells.
fn build_table(el: ElementRef<'_>, ctx: &BuildContext<'_>) -> Table {
    let mut header: Option<Vec<Vec<Inline>>> = None;
    let mut body: Vec<(Vec<Vec<Inline>>, bool)> = Vec::new();

    for child in el.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "thead" => {
                let mut cells: Vec<Vec<Inline>> = Vec::new();
                for tr in children_named(child, "tr") {
                    for th in children_named(tr, "th") {
                        cells.push(collect_inlines(th, ctx));
                    }
                }
                for th in children_named(child, "th") {
                    cells.push(collect_inlines(th, ctx));
                }
                if !cells.is_empty() {
                    header = Some(cells);
                }
            }
            "tbody" => {
                for tr in children_named(child, "tr") {
                    body.push(table_row(tr, ctx));
                }
            }
            "tr" => body.push(table_row(child, ctx)),
            _ => {}
        }
    }

    let mut rows: Vec<Vec<Vec<Inline>>> = Vec::new();
    for (i, (cells, has_th)) in body.into_iter().enumerate() {
        if cells.is_empty() {
            continue;
        }
        if header.is_none() && i == 0 && has_th {
            header = Some(cells);
        } else {
            rows.push(cells);
        }
    }

    Table { header, rows }
}

fn table_row(tr: ElementRef<'_>, ctx: &BuildContext<'_>) -> (Vec<Vec<Inline>>, bool) {
    let mut cells = Vec::new();
    let mut has_th = false;
    for cell in tr.children().filter_map(ElementRef::wrap) {
        match cell.value().name() {
            "td" => cells.push(collect_inlines(cell, ctx)),
            "th" => {
                has_th = true;
                cells.push(collect_inlines(cell, ctx));
            }
            _ => {}
        }
    }
    (cells, has_th)
}
