//! Rendering of the block/inline tree to Markdown text

use super::ir::{Block, Inline, List, Table};
use super::ConvertOptions;

/// Renders a block sequence, blocks separated by blank lines
pub fn render_blocks(blocks: &[Block], opts: &ConvertOptions) -> String {
    let rendered: Vec<String> = blocks
        .iter()
        .map(|block| render_block(block, opts))
        .filter(|s| !s.trim().is_empty())
        .collect();
    rendered.join("\n\n")
}

fn render_block(block: &Block, opts: &ConvertOptions) -> String {
    match block {
        Block::Heading { level, text } => {
            format!("{} {}", "#".repeat(*level as usize), text)
        }
        Block::Paragraph(inlines) => render_inlines(inlines, opts).trim().to_string(),
        Block::List(list) => render_list(list, opts),
        Block::Table(table) => render_table(table, opts),
        Block::CodeBlock { language, code } => {
            format!("```{}\n{}\n```", language, code.trim_matches('\n'))
        }
        Block::Blockquote(blocks) => {
            let inner = render_blocks(blocks, opts);
            let lines: Vec<String> = inner
                .lines()
                .map(|line| {
                    if line.trim().is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {}", line)
                    }
                })
                .collect();
            lines.join("\n")
        }
        Block::Rule => "---".to_string(),
    }
}

fn render_list(list: &List, opts: &ConvertOptions) -> String {
    let bullet = if opts.dash_unordered_list { "-" } else { "*" };
    let mut lines: Vec<String> = Vec::new();

    for (i, item) in list.items.iter().enumerate() {
        let text = render_inlines(&item.inlines, opts).trim().to_string();
        if !text.is_empty() {
            let marker = if list.ordered {
                format!("{}.", list.start + i as u64)
            } else {
                bullet.to_string()
            };
            lines.push(format!("{} {}", marker, text));
        }
        for nested in &item.nested {
            for line in render_list(nested, opts).lines() {
                if line.trim().is_empty() {
                    lines.push(String::new());
                } else {
                    lines.push(format!("  {}", line));
                }
            }
        }
    }

    lines.join("\n")
}

fn render_cell(cell: &[Inline], opts: &ConvertOptions) -> String {
    render_inlines(cell, opts)
        .trim()
        .replace('|', "\\|")
        .replace('\n', " ")
}

/// Renders a table; data rows are padded or truncated to the header's
/// column count so the separator row stays consistent.
fn render_table(table: &Table, opts: &ConvertOptions) -> String {
    let mut lines: Vec<String> = Vec::new();

    match &table.header {
        Some(header) => {
            let cells: Vec<String> = header.iter().map(|c| render_cell(c, opts)).collect();
            let width = cells.len();
            lines.push(format!("| {} |", cells.join(" | ")));
            lines.push(format!("| {} |", vec!["---"; width].join(" | ")));
            for row in &table.rows {
                let mut cells: Vec<String> =
                    row.iter().take(width).map(|c| render_cell(c, opts)).collect();
                cells.resize(width, String::new());
                lines.push(format!("| {} |", cells.join(" | ")));
            }
        }
        None => {
            for row in &table.rows {
                let cells: Vec<String> = row.iter().map(|c| render_cell(c, opts)).collect();
                lines.push(format!("| {} |", cells.join(" | ")));
            }
        }
    }

    lines.join("\n")
}

/// Renders an inline run by simple concatenation; text nodes carry their
/// own spacing.
pub fn render_inlines(inlines: &[Inline], opts: &ConvertOptions) -> String {
    let mut out = String::new();
    for inline in inlines {
        out.push_str(&render_inline(inline, opts));
    }
    out
}

fn render_inline(inline: &Inline, opts: &ConvertOptions) -> String {
    match inline {
        Inline::Text(text) => {
            let collapsed = collapse_whitespace(text);
            if opts.escape_snob {
                escape_markdown(&collapsed)
            } else {
                collapsed
            }
        }
        Inline::Code(code) => format!("`{}`", code.replace('`', "\\`")),
        Inline::Emphasis(children) => delimited("*", children, opts),
        Inline::Strong(children) => delimited("**", children, opts),
        Inline::Strikethrough(children) => delimited("~~", children, opts),
        Inline::Link { text, href } => {
            let rendered = render_inlines(text, opts).trim().to_string();
            let rendered = if rendered.is_empty() {
                href.clone()
            } else {
                rendered
            };
            format!("[{}]({})", escape_brackets(&rendered), href)
        }
        Inline::Image { alt, src } => {
            let alt = escape_brackets(alt)
                .replace('(', "\\(")
                .replace(')', "\\)");
            format!("![{}]({})", alt, src)
        }
        Inline::LineBreak => "\n".to_string(),
    }
}

fn delimited(delimiter: &str, children: &[Inline], opts: &ConvertOptions) -> String {
    let inner = render_inlines(children, opts).trim().to_string();
    if inner.is_empty() {
        String::new()
    } else {
        format!("{}{}{}", delimiter, inner, delimiter)
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_ws = false;
    for ch in text.chars() {
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
    out
}

fn escape_brackets(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}

/// Escapes characters that would otherwise be read as Markdown syntax
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
