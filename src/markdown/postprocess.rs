//! Regex-level normalization and paragraph reflow of rendered Markdown

use super::ConvertOptions;
use once_cell::sync::Lazy;
use regex::Regex;

static EMPTY_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[\]\(\)").unwrap());
static EMPTY_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[\]\(\)").unwrap());
static EXCESS_BLANK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static LIST_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\n])\n(\* )").unwrap());
static NUMBERED_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\n])\n(\d+\. )").unwrap());
static FENCE_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[ \t]+").unwrap());
static FENCE_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+```").unwrap());
static HEADING_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\n])(\n#{1,6} )").unwrap());
static NUMBERED_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\. ").unwrap());

/// Applies the full normalization pipeline to rendered Markdown
pub fn normalize(markdown: &str, opts: &ConvertOptions) -> String {
    let md = EMPTY_IMAGE.replace_all(markdown, "");
    let md = EMPTY_LINK.replace_all(&md, "");
    let md = EXCESS_BLANK.replace_all(&md, "\n\n");
    let md = LIST_SPACING.replace_all(&md, "${1}\n\n${2}");
    let md = NUMBERED_SPACING.replace_all(&md, "${1}\n\n${2}");
    let md = FENCE_OPEN.replace_all(&md, "```");
    let md = FENCE_CLOSE.replace_all(&md, "```");
    let md = HEADING_SPACING.replace_all(&md, "${1}\n${2}");

    let mut md = reflow(&md);
    if opts.body_width > 0 {
        md = wrap_paragraphs(&md, opts.body_width, opts.wrap_links);
    }
    md
}

/// A line kept verbatim instead of being merged into a paragraph
fn is_special(stripped: &str) -> bool {
    stripped.starts_with('#')
        || stripped.starts_with("* ")
        || stripped.starts_with("- ")
        || stripped.starts_with("+ ")
        || NUMBERED_LINE.is_match(stripped)
        || stripped.starts_with("```")
        || stripped.starts_with('|')
        || stripped.starts_with('>')
        || stripped == "---"
}

fn flush(buf: &mut Vec<String>, out: &mut Vec<String>, separator: &str) {
    if !buf.is_empty() {
        out.push(buf.join(separator));
        buf.clear();
    }
}

/// Re-flows the document into paragraphs
///
/// Consecutive non-special lines merge into one paragraph; fenced code,
/// table rows, and blockquote lines are kept contiguous as single units so
/// their internal line structure survives the blank-line join.
fn reflow(markdown: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut fence: Vec<String> = Vec::new();
    let mut table: Vec<String> = Vec::new();
    let mut quote: Vec<String> = Vec::new();
    let mut in_fence = false;

    for line in markdown.lines() {
        let stripped = line.trim();

        if in_fence {
            fence.push(line.to_string());
            if stripped.starts_with("```") {
                in_fence = false;
                flush(&mut fence, &mut paragraphs, "\n");
            }
            continue;
        }

        if stripped.starts_with("```") {
            flush(&mut current, &mut paragraphs, " ");
            flush(&mut table, &mut paragraphs, "\n");
            flush(&mut quote, &mut paragraphs, "\n");
            fence.push(stripped.to_string());
            in_fence = true;
            continue;
        }

        if stripped.starts_with('|') {
            flush(&mut current, &mut paragraphs, " ");
            flush(&mut quote, &mut paragraphs, "\n");
            table.push(stripped.to_string());
            continue;
        }
        flush(&mut table, &mut paragraphs, "\n");

        // A lone ">" is the blank line between quoted paragraphs and must
        // stay inside the quote unit.
        if stripped.starts_with('>') {
            flush(&mut current, &mut paragraphs, " ");
            quote.push(stripped.to_string());
            continue;
        }
        flush(&mut quote, &mut paragraphs, "\n");

        if stripped.is_empty() {
            flush(&mut current, &mut paragraphs, " ");
        } else if is_special(stripped) {
            flush(&mut current, &mut paragraphs, " ");
            // Keep indentation so nested list levels survive
            paragraphs.push(line.trim_end().to_string());
        } else {
            current.push(stripped.to_string());
        }
    }

    flush(&mut fence, &mut paragraphs, "\n");
    flush(&mut table, &mut paragraphs, "\n");
    flush(&mut quote, &mut paragraphs, "\n");
    flush(&mut current, &mut paragraphs, " ");

    paragraphs
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join("\n\n")
        .trim()
        .to_string()
}

/// Greedy word-wrap of plain paragraphs to the configured width
fn wrap_paragraphs(markdown: &str, width: usize, wrap_links: bool) -> String {
    markdown
        .split("\n\n")
        .map(|para| {
            let keep = para.contains('\n')
                || is_special(para.trim())
                || (!wrap_links && para.contains("]("));
            if keep {
                para.to_string()
            } else {
                wrap_text(para, width)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn wrap_text(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}
