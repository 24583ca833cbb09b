// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! HTML rendering for message content blocks.
//!
//! Each [`ContentBlock`] variant maps to one HTML fragment. Textual payloads
//! go through [`render_markdown`]; everything else is rendered from its
//! fields with escaping. Rendering is total: unknown block types, tool names
//! and malformed payloads degrade to placeholders or empty output.
//!
//! The CSS class names emitted here (`thinking-block`, `tool-block`,
//! `search-result-card`, ...) are what the page stylesheet targets.

use crate::escape::{escape_attr, escape_text, plural};
use crate::highlight::highlight;
use crate::inline::is_script_url;
use crate::markdown::render_markdown;
use crate::parser::{
    CodeExecution, ContentBlock, ImageSource, Knowledge, SearchResult, ToolResult,
    ToolResultContent, ToolUse, WebSearchOutcome,
};
use crate::renderer::RenderOptions;
use serde_json::Value;
use tracing::debug;

/// Text the service substitutes for blocks its exporter cannot represent.
pub const UNSUPPORTED_BLOCK_TEXT: &str = "This block is not supported on your current device yet.";

const THINKING_ICON: &str = r#"<svg class="thinking-icon" width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M12 2a8 8 0 0 0-8 8c0 3.4 2.1 6.3 5 7.5V20a1 1 0 0 0 1 1h4a1 1 0 0 0 1-1v-2.5c2.9-1.2 5-4.1 5-7.5a8 8 0 0 0-8-8z"/><line x1="10" y1="22" x2="14" y2="22"/></svg>"#;
const SEARCH_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><circle cx="11" cy="11" r="8"/><line x1="21" y1="21" x2="16.65" y2="16.65"/></svg>"#;
const SMALL_SEARCH_ICON: &str = r#"<svg width="14" height="14" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><circle cx="11" cy="11" r="8"/><line x1="21" y1="21" x2="16.65" y2="16.65"/></svg>"#;
const FETCH_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M18 13v6a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2V8a2 2 0 0 1 2-2h6"/><polyline points="15 3 21 3 21 9"/><line x1="10" y1="14" x2="21" y2="3"/></svg>"#;
const CODE_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><polyline points="16 18 22 12 16 6"/><polyline points="8 6 2 12 8 18"/></svg>"#;
const TOOL_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M14.7 6.3a1 1 0 0 0 0 1.4l1.6 1.6a1 1 0 0 0 1.4 0l3.77-3.77a6 6 0 0 1-7.940 7.94l-6.91 6.91a2.12 2.12 0 0 1-3-3l6.91-6.91a6 6 0 0 1 7.94-7.94l-3.76 3.76z"/></svg>"#;
pub(crate) const FILE_ICON: &str = r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M13 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V9z"/><polyline points="13 2 13 9 20 9"/></svg>"#;

/// Renders a message's content blocks, honoring the display options.
///
/// Text blocks that only carry the [`UNSUPPORTED_BLOCK_TEXT`] placeholder
/// are dropped. Each remaining block is rendered with the full block list
/// available as sibling context.
#[must_use]
pub fn render_blocks(blocks: &[ContentBlock], opts: &RenderOptions) -> String {
    blocks
        .iter()
        .filter(|block| is_visible(block, opts))
        .map(|block| render_block(block, blocks))
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_visible(block: &ContentBlock, opts: &RenderOptions) -> bool {
    match block {
        ContentBlock::Text { text } => !is_unsupported_placeholder(text),
        ContentBlock::Thinking { .. } | ContentBlock::RedactedThinking => opts.show_thinking,
        ContentBlock::ToolUse(_)
        | ContentBlock::ToolResult(_)
        | ContentBlock::WebSearchToolResult(_)
        | ContentBlock::CodeExecutionResult(_) => opts.show_tools,
        _ => true,
    }
}

/// Returns `true` when a text body is only the unsupported-block placeholder,
/// optionally wrapped in a code fence.
#[must_use]
pub fn is_unsupported_placeholder(text: &str) -> bool {
    text.trim().trim_matches('`').trim() == UNSUPPORTED_BLOCK_TEXT
}

/// Renders a single block to HTML.
///
/// `siblings` is the full block list of the message; tool results use it
/// to find the invocation they answer.
#[must_use]
pub fn render_block(block: &ContentBlock, siblings: &[ContentBlock]) -> String {
    match block {
        ContentBlock::Text { text } => {
            format!(r#"<div class="text-block">{}</div>"#, render_markdown(text))
        }
        ContentBlock::Thinking { thinking } => format!(
            r#"<details class="thinking-block"><summary>{THINKING_ICON} Thinking</summary><div class="thinking-content">{}</div></details>"#,
            render_markdown(thinking)
        ),
        ContentBlock::RedactedThinking => {
            format!(r#"<div class="redacted-thinking">{THINKING_ICON} Thinking (redacted)</div>"#)
        }
        ContentBlock::ToolUse(tool) => render_tool_use(tool),
        ContentBlock::ToolResult(result) => render_tool_result(result, siblings),
        ContentBlock::WebSearchToolResult(outcome) => render_web_search(outcome),
        ContentBlock::WebSearchResult(result) => render_search_result_card(result),
        ContentBlock::CodeExecutionResult(exec) => render_code_execution(exec),
        ContentBlock::Image(source) => render_image(source),
        ContentBlock::Knowledge(knowledge) => render_knowledge(knowledge),
        ContentBlock::Other { kind } => {
            debug!(kind = %kind, "rendering placeholder for unrecognized block");
            format!(r#"<div class="unknown-block">[{}]</div>"#, escape_text(kind))
        }
    }
}

fn render_tool_use(tool: &ToolUse) -> String {
    let input = &tool.input;
    match tool.name.as_str() {
        "create_artifact" | "update_artifact" | "rewrite_artifact" => render_artifact(input),
        "web_search" | "brave_search" => {
            let query = input_str(input, "query")
                .or_else(|| input_str(input, "q"))
                .map_or_else(|| input.to_string(), str::to_owned);
            format!(
                r#"<div class="tool-block search-query-block"><div class="tool-header">{SEARCH_ICON} Searching: "{}"</div></div>"#,
                escape_text(&query)
            )
        }
        "web_fetch" => {
            let label = tool.message.clone().unwrap_or_else(|| {
                format!("Fetching: {}", input_str(input, "url").unwrap_or_default())
            });
            format!(
                r#"<div class="tool-block search-query-block"><div class="tool-header">{FETCH_ICON} {}</div></div>"#,
                escape_text(&label)
            )
        }
        "code_execution" | "execute_code" => {
            let code = input_str(input, "code")
                .or_else(|| input_str(input, "source"))
                .map_or_else(|| pretty_json(input), str::to_owned);
            let lang = input_str(input, "language").unwrap_or("python");
            format!(
                r#"<div class="tool-block code-exec-block"><div class="tool-header">{CODE_ICON} Code Execution</div>{}</div>"#,
                code_panel(&code, lang)
            )
        }
        name => {
            debug!(tool = %name, "rendering generic tool panel");
            format!(
                r#"<div class="tool-block"><div class="tool-header">{TOOL_ICON} {}</div><details class="tool-input-details"><summary>Input</summary><pre class="tool-input"><code>{}</code></pre></details></div>"#,
                escape_text(name),
                escape_text(&pretty_json(input))
            )
        }
    }
}

fn render_artifact(input: &Value) -> String {
    let title = input_str(input, "title").unwrap_or("Artifact");
    let content = input_str(input, "content").unwrap_or_default();
    let artifact_type = input_str(input, "type");
    let lang = input_str(input, "language")
        .or(artifact_type)
        .unwrap_or("text");
    let is_html = lang == "html" || artifact_type.is_some_and(|t| t.contains("html"));

    let mut html = format!(
        r#"<div class="artifact-block" data-artifact-type="{lang_attr}"><div class="artifact-header">{FILE_ICON} <span class="artifact-title">{title}</span> <span class="artifact-lang">{lang_text}</span></div>"#,
        lang_attr = escape_attr(lang),
        title = escape_text(title),
        lang_text = escape_text(lang),
    );
    if is_html {
        html.push_str(
            r#"<div class="artifact-tabs"><button class="artifact-tab active" data-tab="code">Code</button><button class="artifact-tab" data-tab="preview">Preview</button></div>"#,
        );
    }
    html.push_str(r#"<div class="artifact-content artifact-code-view">"#);
    html.push_str(&code_panel(content, lang));
    html.push_str("</div>");
    if is_html {
        html.push_str(&format!(
            r#"<div class="artifact-content artifact-preview-view" style="display:none"><iframe sandbox="allow-scripts" srcdoc="{}"></iframe></div>"#,
            escape_attr(content)
        ));
    }
    html.push_str("</div>");
    html
}

/// A highlighted `<pre class="code-block">` for raw (unescaped) code.
fn code_panel(code: &str, lang: &str) -> String {
    let lang_attr = escape_attr(lang);
    format!(
        r#"<pre class="code-block" data-lang="{lang_attr}"><code class="language-{lang_attr}">{}</code></pre>"#,
        highlight(&escape_text(code), lang)
    )
}

fn render_tool_result(result: &ToolResult, siblings: &[ContentBlock]) -> String {
    let error_class = if result.is_error { " tool-error" } else { "" };
    let tool_attr = resolve_tool_name(result, siblings)
        .map(|name| format!(r#" data-tool="{}""#, escape_attr(name)))
        .unwrap_or_default();

    match &result.content {
        ToolResultContent::Blocks(blocks) => {
            let sources: Vec<&Knowledge> = blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Knowledge(k) => Some(k),
                    _ => None,
                })
                .collect();
            if !sources.is_empty() {
                return render_sources(&sources);
            }

            blocks
                .iter()
                .map(|b| match b {
                    ContentBlock::Text { text } => format!(
                        r#"<div class="tool-result{error_class}"{tool_attr}>{}</div>"#,
                        render_markdown(text)
                    ),
                    ContentBlock::Image(source) => render_image(source),
                    ContentBlock::WebSearchResult(r) => render_search_result_card(r),
                    ContentBlock::Knowledge(k) => render_knowledge(k),
                    other => format!(
                        r#"<div class="tool-result"{tool_attr}>[{}]</div>"#,
                        escape_text(other.tag())
                    ),
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        ToolResultContent::Text(text) => format!(
            r#"<div class="tool-result{error_class}"{tool_attr}>{}</div>"#,
            render_markdown(text)
        ),
        ToolResultContent::Empty => {
            if let Some(link) = &result.display_link {
                return render_knowledge(link);
            }
            result.message.as_deref().map_or_else(String::new, |message| {
                format!(
                    r#"<div class="tool-result"{tool_attr}>{}</div>"#,
                    render_markdown(message)
                )
            })
        }
    }
}

/// The result's own tool name, or the name of the sibling invocation whose
/// id it references.
fn resolve_tool_name<'a>(result: &'a ToolResult, siblings: &'a [ContentBlock]) -> Option<&'a str> {
    if let Some(name) = result.name.as_deref() {
        return Some(name);
    }
    let id = result.tool_use_id.as_deref()?;
    siblings.iter().find_map(|b| match b {
        ContentBlock::ToolUse(tool) if tool.id.as_deref() == Some(id) => Some(tool.name.as_str()),
        _ => None,
    })
}

fn render_sources(sources: &[&Knowledge]) -> String {
    let cards: Vec<String> = sources.iter().map(|k| render_knowledge(k)).collect();
    format!(
        r#"<details class="search-results-block"><summary class="search-results-header">{SMALL_SEARCH_ICON} {n} source{s} found</summary><div class="search-results-list">{cards}</div></details>"#,
        n = sources.len(),
        s = plural(sources.len()),
        cards = cards.join("\n"),
    )
}

fn render_web_search(outcome: &WebSearchOutcome) -> String {
    match outcome {
        WebSearchOutcome::Results(results) if !results.is_empty() => {
            let cards: Vec<String> = results.iter().map(render_search_result_card).collect();
            format!(
                r#"<div class="search-results-block"><div class="search-results-header">{SMALL_SEARCH_ICON} {n} source{s} found</div><div class="search-results-list">{cards}</div></div>"#,
                n = results.len(),
                s = plural(results.len()),
                cards = cards.join("\n"),
            )
        }
        WebSearchOutcome::Error(message) => format!(
            r#"<div class="tool-result tool-error">Search error: {}</div>"#,
            escape_text(message)
        ),
        WebSearchOutcome::Results(_) | WebSearchOutcome::Empty => String::new(),
    }
}

fn render_search_result_card(result: &SearchResult) -> String {
    let url = result.url.as_deref().unwrap_or("#");
    let title = result.title.as_deref().unwrap_or(url);
    let domain = host_of(url).unwrap_or_else(|| url.to_owned());
    let age = result
        .page_age
        .as_deref()
        .map(|age| format!(r#" <span class="result-age">{}</span>"#, escape_text(age)))
        .unwrap_or_default();

    format!(
        r#"<a class="search-result-card" href="{}" target="_blank" rel="noopener"><div class="result-title">{}</div><div class="result-url">{}{age}</div></a>"#,
        safe_href(url),
        escape_text(title),
        escape_text(&domain),
    )
}

fn render_knowledge(knowledge: &Knowledge) -> String {
    let favicon = knowledge
        .favicon_url
        .as_deref()
        .map(|src| {
            format!(
                r#"<img class="result-favicon" src="{}" width="14" height="14" alt="">"#,
                escape_attr(src)
            )
        })
        .unwrap_or_default();
    let title = escape_text(&knowledge.title);

    let Some(url) = knowledge.url.as_deref() else {
        return format!(r#"<div class="knowledge-ref">{favicon} {title}</div>"#);
    };

    let site = knowledge
        .site_name
        .clone()
        .or_else(|| knowledge.site_domain.clone())
        .or_else(|| host_of(url))
        .unwrap_or_default();

    format!(
        r#"<a class="search-result-card" href="{}" target="_blank" rel="noopener"><div class="result-title">{favicon} {title}</div><div class="result-url">{}</div></a>"#,
        safe_href(url),
        escape_text(&site),
    )
}

fn render_code_execution(exec: &CodeExecution) -> String {
    let sections = [
        ("exec-output", "Output", &exec.output),
        ("exec-return", "Return", &exec.return_value),
        ("exec-error", "Error", &exec.error),
    ];

    let mut html = String::from(r#"<div class="code-exec-result">"#);
    for (class, label, value) in sections {
        if let Some(text) = value.as_deref().filter(|t| !t.is_empty()) {
            html.push_str(&format!(
                r#"<div class="{class}"><div class="exec-label">{label}</div><pre><code>{}</code></pre></div>"#,
                escape_text(text)
            ));
        }
    }
    html.push_str("</div>");
    html
}

fn render_image(source: &ImageSource) -> String {
    match source {
        ImageSource::Base64 { media_type, data } => format!(
            r#"<img class="message-image" src="data:{};base64,{}" alt="Image">"#,
            escape_attr(media_type),
            escape_attr(data)
        ),
        ImageSource::Url(url) => format!(
            r#"<img class="message-image" src="{}" alt="Image">"#,
            escape_attr(url)
        ),
        ImageSource::Missing => {
            debug!("image block has no usable source");
            r#"<div class="unknown-block">[Image]</div>"#.to_owned()
        }
    }
}

fn input_str<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// The host name of a URL, if it parses and has one.
fn host_of(url: &str) -> Option<String> {
    url::Url::parse(url)
        .ok()?
        .host_str()
        .map(str::to_owned)
}

/// An attribute-escaped link target, with script URLs neutralized.
fn safe_href(url: &str) -> String {
    if is_script_url(url) {
        "#".to_owned()
    } else {
        escape_attr(url)
    }
}
