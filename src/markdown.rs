// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Markdown to HTML conversion for message text.
//!
//! This is a pragmatic subset of markdown, not a standards-compliant parser.
//! Conversion happens in three stages:
//!
//! 1. The whole text is HTML-escaped.
//! 2. Fenced code blocks and inline code spans are rendered and swapped out
//!    for private-use placeholders, so no later rule can touch their content.
//! 3. A line-by-line block parser emits headings, rules, blockquotes, lists,
//!    tables and paragraphs, running [`format_inline`] on text runs.
//!
//! Blocks never nest: opening any construct closes whichever one is open.
//!
//! # Example
//!
//! ```
//! use claude2html::markdown::render_markdown;
//!
//! let html = render_markdown("# Title\n\n- one\n- two");
//! assert_eq!(html, "<h1>Title</h1>\n<ul>\n<li>one</li>\n<li>two</li>\n</ul>");
//! ```

use crate::escape::escape_text;
use crate::highlight::highlight;
use crate::inline::format_inline;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Opens a placeholder for a rendered fenced code block.
const FENCE_OPEN: char = '\u{E000}';
/// Closes any placeholder.
const PLACEHOLDER_CLOSE: char = '\u{E001}';
/// Opens a placeholder for a rendered inline code span.
const INLINE_OPEN: char = '\u{E002}';

/// Returns `true` for the private-use characters that delimit protected spans.
pub(crate) const fn is_placeholder_marker(c: char) -> bool {
    matches!(c, FENCE_OPEN | PLACEHOLDER_CLOSE | INLINE_OPEN)
}

fn fence_regex() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"(?s)```([^\n`]*?)\n(.*?)```").expect("valid fence regex"))
}

fn inline_code_regex() -> &'static Regex {
    static INLINE_CODE: OnceLock<Regex> = OnceLock::new();
    INLINE_CODE.get_or_init(|| Regex::new(r"`([^`\n]+)`").expect("valid inline code regex"))
}

/// Renders markdown text to an HTML fragment.
///
/// Never fails: anything not recognized becomes a paragraph.
#[must_use]
pub fn render_markdown(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let cleaned: String = text
        .chars()
        .filter(|&c| !is_placeholder_marker(c))
        .collect();
    let escaped = escape_text(&cleaned);

    let mut protected = Vec::new();
    let with_fences = fence_regex().replace_all(&escaped, |caps: &Captures<'_>| {
        let lang = caps[1].trim();
        let html = render_code_block(&caps[2], lang);
        placeholder(FENCE_OPEN, &mut protected, html)
    });
    let with_code = inline_code_regex().replace_all(&with_fences, |caps: &Captures<'_>| {
        // Quotes are escaped here too; inline code is never highlighted.
        let html = format!(
            r#"<code class="inline-code">{}</code>"#,
            caps[1].replace('"', "&quot;")
        );
        placeholder(INLINE_OPEN, &mut protected, html)
    });

    let html = BlockParser::default().run(&with_code);
    restore_placeholders(&html, &protected)
}

/// Renders one fenced code block whose body is already escaped.
fn render_code_block(code: &str, lang: &str) -> String {
    let lang_attr = lang.replace('"', "&quot;");
    let class_lang = if lang.is_empty() { "text" } else { lang_attr.as_str() };
    let body = code.trim_start_matches(['\n', '\r']).trim_end();
    format!(
        r#"<pre class="code-block" data-lang="{lang_attr}"><code class="language-{class_lang}">{}</code></pre>"#,
        highlight(body, lang)
    )
}

fn placeholder(open: char, protected: &mut Vec<String>, html: String) -> String {
    protected.push(html);
    format!("{open}{}{PLACEHOLDER_CLOSE}", protected.len() - 1)
}

fn restore_placeholders(html: &str, protected: &[String]) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(start) = rest.find([FENCE_OPEN, INLINE_OPEN]) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + FENCE_OPEN.len_utf8()..];
        let Some(end) = after_open.find(PLACEHOLDER_CLOSE) else {
            rest = after_open;
            continue;
        };
        if let Some(saved) = after_open[..end]
            .parse::<usize>()
            .ok()
            .and_then(|i| protected.get(i))
        {
            out.push_str(saved);
        }
        rest = &after_open[end + PLACEHOLDER_CLOSE.len_utf8()..];
    }
    out.push_str(rest);
    out
}

/// The block construct currently open, if any.
///
/// Holding at most one variant keeps constructs from nesting.
#[derive(Debug, Default)]
enum Open {
    #[default]
    Nothing,
    List,
    OrderedList,
    Blockquote,
    /// Buffered rows; the first row is the header.
    Table(Vec<Vec<String>>),
}

/// Line-scan state for a single markdown conversion.
#[derive(Debug, Default)]
struct BlockParser {
    out: Vec<String>,
    open: Open,
}

impl BlockParser {
    fn run(mut self, text: &str) -> String {
        for raw in text.split('\n') {
            self.line(raw.strip_suffix('\r').unwrap_or(raw));
        }
        self.close();
        self.out.join("\n")
    }

    fn line(&mut self, line: &str) {
        if line.contains(FENCE_OPEN) {
            self.close();
            self.out.push(line.to_owned());
            return;
        }

        if is_table_row(line) {
            if !matches!(self.open, Open::Table(_)) {
                self.close();
                self.open = Open::Table(Vec::new());
            }
            if !is_separator_row(line) {
                if let Open::Table(rows) = &mut self.open {
                    rows.push(table_cells(line));
                }
            }
            return;
        }
        if matches!(self.open, Open::Table(_)) {
            self.close();
        }

        if let Some((level, content)) = heading(line) {
            self.close();
            self.out
                .push(format!("<h{level}>{}</h{level}>", format_inline(content)));
            return;
        }

        if is_horizontal_rule(line) {
            self.close();
            self.out.push("<hr>".to_owned());
            return;
        }

        if let Some(content) = blockquote(line) {
            self.open_if_needed(Open::Blockquote, "<blockquote>");
            self.out.push(format!("<p>{}</p>", format_inline(content)));
            return;
        }
        if matches!(self.open, Open::Blockquote) {
            self.close();
        }

        let blank = line.trim().is_empty();

        if let Some(content) = bullet_item(line) {
            self.open_if_needed(Open::List, "<ul>");
            self.out.push(format!("<li>{}</li>", format_inline(content)));
            return;
        }
        if let Some(content) = ordered_item(line) {
            self.open_if_needed(Open::OrderedList, "<ol>");
            self.out.push(format!("<li>{}</li>", format_inline(content)));
            return;
        }

        // Blank lines never close a list.
        if blank {
            return;
        }

        self.close();
        self.out.push(format!("<p>{}</p>", format_inline(line)));
    }

    fn open_if_needed(&mut self, construct: Open, opening: &str) {
        if std::mem::discriminant(&self.open) != std::mem::discriminant(&construct) {
            self.close();
            self.out.push(opening.to_owned());
            self.open = construct;
        }
    }

    /// Emits closing markup for the open construct, if any.
    fn close(&mut self) {
        match std::mem::take(&mut self.open) {
            Open::Nothing => {}
            Open::List => self.out.push("</ul>".to_owned()),
            Open::OrderedList => self.out.push("</ol>".to_owned()),
            Open::Blockquote => self.out.push("</blockquote>".to_owned()),
            Open::Table(rows) => {
                if let Some(table) = render_table(&rows) {
                    self.out.push(table);
                }
            }
        }
    }
}

fn is_table_row(line: &str) -> bool {
    line.len() >= 2 && line.starts_with('|') && line.ends_with('|')
}

fn is_separator_row(line: &str) -> bool {
    let inner = &line[1..line.len() - 1];
    !inner.is_empty()
        && inner
            .chars()
            .all(|c| c == '-' || c == ':' || c == '|' || c.is_whitespace())
}

fn table_cells(line: &str) -> Vec<String> {
    line[1..line.len() - 1]
        .split('|')
        .map(|cell| format_inline(cell.trim()))
        .collect()
}

fn render_table(rows: &[Vec<String>]) -> Option<String> {
    let (header, body) = rows.split_first()?;
    let mut html = String::from("<table><thead><tr>");
    for cell in header {
        html.push_str("<th>");
        html.push_str(cell);
        html.push_str("</th>");
    }
    html.push_str("</tr></thead><tbody>");
    for row in body {
        html.push_str("<tr>");
        for cell in row {
            html.push_str("<td>");
            html.push_str(cell);
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    Some(html)
}

/// `#` to `######`, whitespace, then non-empty text.
fn heading(line: &str) -> Option<(usize, &str)> {
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let content = rest.trim_start();
    (!content.is_empty()).then_some((level, content))
}

/// Three or more of the same `-`, `*` or `_` and nothing else.
fn is_horizontal_rule(line: &str) -> bool {
    let Some(first) = line.chars().next() else {
        return false;
    };
    matches!(first, '-' | '*' | '_') && line.len() >= 3 && line.chars().all(|c| c == first)
}

/// A line starting with an escaped `>`, minus the marker and one space.
fn blockquote(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("&gt;")?;
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_whitespace() => Some(chars.as_str()),
        _ => Some(rest),
    }
}

/// Optional indentation, a `-`, `*` or `+` marker, then whitespace.
fn bullet_item(line: &str) -> Option<&str> {
    let rest = line.trim_start();
    let rest = rest.strip_prefix(['-', '*', '+'])?;
    list_item_content(rest)
}

/// Optional indentation, digits and a period, then whitespace.
fn ordered_item(line: &str) -> Option<&str> {
    let rest = line.trim_start();
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = rest[digits..].strip_prefix('.')?;
    list_item_content(rest)
}

fn list_item_content(after_marker: &str) -> Option<&str> {
    after_marker
        .starts_with(char::is_whitespace)
        .then(|| after_marker.trim_start())
}
