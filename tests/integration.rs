// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Integration tests for claude2html parsing and rendering.

use claude2html::markdown::render_markdown;
use claude2html::parser::{self, AttachmentMap, Message};
use claude2html::renderer::{self, RenderOptions};
use serde_json::json;
use std::fs;
use std::path::Path;

fn fixtures_dir() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn render_fixture(name: &str, attachments: &AttachmentMap) -> String {
    let json = fs::read_to_string(fixtures_dir().join(name)).expect("Failed to read fixture");
    let conversation = parser::parse_conversation(&json).expect("Failed to parse fixture");
    renderer::render_conversation(&conversation, attachments, &RenderOptions::default())
}

/// Counts occurrences of an opening tag, with or without attributes.
fn count_open(html: &str, tag: &str) -> usize {
    html.matches(&format!("<{tag}>")).count() + html.matches(&format!("<{tag} ")).count()
}

fn assert_balanced(html: &str) {
    for tag in [
        "ul", "ol", "li", "blockquote", "table", "thead", "tbody", "tr", "th", "td", "p", "pre",
        "details", "div",
    ] {
        assert_eq!(
            count_open(html, tag),
            html.matches(&format!("</{tag}>")).count(),
            "Unbalanced <{tag}> in:\n{html}"
        );
    }
}

/// Parses all JSON fixtures and verifies they produce a complete page.
#[test]
fn renders_all_fixtures() {
    for entry in fs::read_dir(fixtures_dir()).expect("Failed to read fixtures directory") {
        let path = entry.expect("Failed to read directory entry").path();
        if path.extension().is_none_or(|ext| ext != "json") {
            continue;
        }

        let json = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
        let conversation = parser::parse_conversation(&json)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()));
        let html = renderer::render_conversation(
            &conversation,
            &AttachmentMap::new(),
            &RenderOptions::default(),
        );

        assert!(
            html.starts_with("<!DOCTYPE html>"),
            "Invalid document start in {}",
            path.display()
        );
        assert_eq!(
            html.matches(r#"<div class="message message-"#).count(),
            conversation.messages.len(),
            "Message count mismatch in {}",
            path.display()
        );
    }
}

#[test]
fn fixture_renders_messages_in_index_order() {
    let html = render_fixture("research.json", &AttachmentMap::new());

    let positions: Vec<usize> = [
        "Which async runtime",
        "runtime</em> comparison",
        "Can you build a demo?",
        "Here is a demo artifact.",
        "ReferenceError",
    ]
    .iter()
    .map(|needle| html.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
    .collect();

    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
}

#[test]
fn fixture_renders_every_block_kind() {
    let html = render_fixture("research.json", &AttachmentMap::new());

    assert!(html.contains("<title>Comparing &lt;b&gt;async&lt;/b&gt; runtimes</title>"));
    assert!(html.contains("claude-sonnet-4-20250514 &middot; 2025-03-02 14:05 UTC"));
    assert!(html.contains(r#"<details class="thinking-block">"#));
    assert!(html.contains(r#"Searching: "rust async runtime comparison""#));
    assert!(html.contains("2 sources found"));
    assert!(html.contains(r#"<span class="result-age">3 weeks ago</span>"#));
    assert!(html.contains("<h2>Options</h2>"));
    assert!(html.contains("<th>Runtime</th>"));
    assert!(html.contains("<td>work-stealing</td>"));
    assert!(html.contains(r#"<pre class="code-block" data-lang="rust">"#));
    assert!(html.contains(r#"<span class="hl-comment">// start</span>"#));
    assert!(html.contains(r#"<span class="hl-number">42</span>"#));
    assert!(html.contains(r#"<a href="https://tokio.rs" target="_blank" rel="noopener">the docs</a>"#));
    assert!(!html.contains("javascript:alert"));
    assert!(!html.contains("not supported on your current device"));
    assert!(html.contains(r#"<iframe sandbox="allow-scripts""#));
    assert!(html.contains(r#"data-tool="create_artifact""#));
    assert!(html.contains("Artifact created"));
    assert!(html.contains(r#"<div class="tool-result tool-error" data-tool="repl">"#));
    assert!(html.contains(r#"<div class="exec-output"><div class="exec-label">Output</div>"#));
    assert!(html.contains(r#"<div class="unknown-block">[future_block_type]</div>"#));
    assert!(html.contains("Thinking (redacted)"));
    assert!(!html.contains("opaque"));
}

#[test]
fn fixture_uploads_degrade_without_attachment_map() {
    let html = render_fixture("research.json", &AttachmentMap::new());

    assert!(html.contains(r#"<span class="uploaded-file-name">diagram.png</span>"#));
    assert!(html.contains("notes.pdf (4 pages)"));
    assert!(!html.contains("doc-thumbnail"));
    assert!(html.contains(r#"<span class="att-size">(312 B)</span>"#));
    assert!(html.contains("tokio = \"1\""));
}

#[test]
fn fixture_uploads_inline_resolved_payloads() {
    let attachments = parser::parse_attachment_map(
        r#"{"img-1": "data:image/png;base64,iVBORw0KGgo=", "doc-1": "data:image/webp;base64,UklGRg==", "other": null}"#,
    )
    .unwrap();
    let html = render_fixture("research.json", &attachments);

    assert!(html.contains(r#"<img src="data:image/png;base64,iVBORw0KGgo=" alt="diagram.png" loading="lazy">"#));
    assert!(html.contains(r#"<img class="doc-thumbnail" src="data:image/webp;base64,UklGRg==" alt="notes.pdf">"#));
}

#[test]
fn fixture_page_is_balanced() {
    let html = render_fixture("research.json", &AttachmentMap::new());
    let main_start = html.find("<main").unwrap();
    let main_end = html.find("</main>").unwrap();

    assert_balanced(&html[main_start..main_end]);
}

/// Tiny deterministic generator so the fuzz cases are reproducible.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn string(&mut self, alphabet: &[char], max_len: u64) -> String {
        let len = self.next() % (max_len + 1);
        (0..len)
            .map(|_| {
                let i = usize::try_from(self.next() % alphabet.len() as u64).unwrap();
                alphabet[i]
            })
            .collect()
    }
}

#[test]
fn renders_arbitrary_block_tags() {
    let alphabet: Vec<char> = "abz_<>&\"' \u{E000}\u{E001}\u{E002}é🦀".chars().collect();
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);

    for _ in 0..500 {
        let tag = rng.string(&alphabet, 12);
        let name = rng.string(&alphabet, 8);
        let message = Message::from_value(&json!({
            "index": 0,
            "sender": "assistant",
            "content": [
                {"type": tag, "text": "x", "input": {"a": 1}},
                {"type": "tool_use", "name": name, "input": null},
                {"type": "tool_result", "content": [{"type": tag}]},
                {"type": "image", "source": {"type": tag}}
            ]
        }));

        let html = renderer::render_message(&message, &AttachmentMap::new());
        assert!(html.ends_with("</div>"));
        assert!(!html.contains("<z"), "unescaped tag text for {tag:?}: {html}");
    }
}

#[test]
fn renders_every_known_tag_with_empty_payload() {
    for tag in [
        "text",
        "thinking",
        "redacted_thinking",
        "tool_use",
        "server_tool_use",
        "tool_result",
        "web_search_tool_result",
        "web_search_result",
        "code_execution_tool_result",
        "image",
        "knowledge",
    ] {
        let message = Message::from_value(&json!({"content": [{"type": tag}]}));
        let html = renderer::render_message(&message, &AttachmentMap::new());
        assert_balanced(&html);
    }
}

#[test]
fn markdown_output_is_balanced_for_arbitrary_lines() {
    let lines = [
        "- item",
        "* star item",
        "+ plus item",
        "1. first",
        "22. second",
        "> quote",
        ">",
        "| a | b |",
        "| --- | :-: |",
        "|x|",
        "# heading",
        "---",
        "",
        "plain **bold** text",
        "```",
        "```py",
        "`code`",
        "|",
    ];
    let mut rng = XorShift(42);

    for _ in 0..300 {
        let count = rng.next() % 12;
        let doc: Vec<&str> = (0..count)
            .map(|_| lines[usize::try_from(rng.next() % lines.len() as u64).unwrap()])
            .collect();
        let html = render_markdown(&doc.join("\n"));
        assert_balanced(&html);
    }
}

#[test]
fn rendering_is_repeatable() {
    let json = fs::read_to_string(fixtures_dir().join("research.json")).unwrap();
    let conversation = parser::parse_conversation(&json).unwrap();
    let attachments = AttachmentMap::new();

    for message in &conversation.messages {
        assert_eq!(
            renderer::render_message(message, &attachments),
            renderer::render_message(message, &attachments)
        );
    }
}

#[test]
fn tool_result_fallback_chain() {
    let with_message = Message::from_value(&json!({
        "content": [{"type": "tool_result", "content": [], "message": "Fetched **page**"}]
    }));
    let without = Message::from_value(&json!({
        "content": [{"type": "tool_result", "content": []}]
    }));

    let html = renderer::render_message(&with_message, &AttachmentMap::new());
    assert!(html.contains("<p>Fetched <strong>page</strong></p>"));

    let html = renderer::render_message(&without, &AttachmentMap::new());
    assert!(html.contains(r#"<div class="message-content"></div>"#));
}

#[test]
fn hide_options_remove_blocks() {
    let json = fs::read_to_string(fixtures_dir().join("research.json")).unwrap();
    let conversation = parser::parse_conversation(&json).unwrap();
    let opts = RenderOptions {
        show_thinking: false,
        show_tools: false,
        fragment: true,
        ..Default::default()
    };
    let html = renderer::render_conversation(&conversation, &AttachmentMap::new(), &opts);

    assert!(!html.contains("thinking-block"));
    assert!(!html.contains("redacted-thinking"));
    assert!(!html.contains("tool-block"));
    assert!(!html.contains("search-results-block"));
    assert!(html.contains("Here is a demo artifact."));
    assert!(html.contains(r#"<div class="unknown-block">[future_block_type]</div>"#));
}

#[test]
fn rejects_non_conversation_input() {
    assert!(parser::parse_conversation("").is_err());
    assert!(parser::parse_conversation("\"just a string\"").is_err());
    assert!(parser::parse_conversation("{\"chat_messages\": 5}").is_ok());
}
