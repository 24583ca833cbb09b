// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! HTML rendering for parsed Claude conversations.
//!
//! This module turns a [`Conversation`] into a self-contained HTML page:
//! styles and the viewer script are embedded, and uploaded files are inlined
//! from an [`AttachmentMap`] prepared by the caller.
//!
//! # Output Format
//!
//! The rendered page includes:
//! - A sticky header with the conversation title, model and creation time
//! - Buttons for theme switching, expanding all thinking blocks and a minimap
//! - One `message message-<sender>` element per message, in `index` order
//! - Per-message uploaded files and pasted text attachments
//!
//! # Example
//!
//! ```
//! use claude2html::parser::parse_conversation;
//! use claude2html::renderer::{render_conversation, RenderOptions};
//! use std::collections::HashMap;
//!
//! let conversation = parse_conversation(r#"{
//!     "name": "Hello",
//!     "chat_messages": [
//!         {"index": 1, "sender": "assistant", "content": [{"type": "text", "text": "Hi there!"}]},
//!         {"index": 0, "sender": "human", "text": "Hello!"}
//!     ]
//! }"#).unwrap();
//!
//! let html = render_conversation(&conversation, &HashMap::new(), &RenderOptions::default());
//!
//! assert!(html.starts_with("<!DOCTYPE html>"));
//! assert!(html.find("Hello!").unwrap() < html.find("Hi there!").unwrap());
//! ```

use crate::blocks::{FILE_ICON, render_blocks};
use crate::escape::{escape_attr, escape_text, format_file_size};
use crate::markdown::render_markdown;
use crate::parser::{
    AttachmentMap, Conversation, FileKind, Message, Sender, TextAttachment, UploadedFile,
};
use chrono::{DateTime, Utc};
use std::fmt::Write;
use tracing::debug;

const STYLE: &str = include_str!("../assets/style.css");
const VIEWER_SCRIPT: &str = include_str!("../assets/viewer.js");

const CLAUDE_LOGO: &str = r#"<svg width="20" height="20" viewBox="0 0 24 24" fill="currentColor"><path d="M16.1 2.96l-4.6 8-1.86-3.22L12.96 2.2a.78.78 0 0 1 1.36 0l1.78 .76zM17.9 17.04l-4.6-8 1.86-3.22 5.32 9.22a.78.78 0 0 1-.68 1.17l-1.9-.17zM6.1 17.04l4.6-8-1.86 3.22-5.32-9.22a.78.78 0 0 1 .68-1.17l1.9 .17zM12 22a2 2 0 1 0 0-4 2 2 0 0 0 0 4z"/></svg>"#;
const ATTACHMENT_ICON: &str = r#"<svg width="14" height="14" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M21.44 11.05l-9.19 9.19a6 6 0 0 1-8.49-8.49l9.19-9.19a4 4 0 0 1 5.66 5.66l-9.2 9.19a2 2 0 0 1-2.83-2.83l8.49-8.48"/></svg>"#;

/// Color scheme the page opens with.
///
/// The viewer's toggle button and a remembered choice in local storage
/// take precedence once the page is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// The value of the page's `data-theme` attribute.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Configuration options for HTML rendering.
///
/// Controls which optional elements are included in the rendered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Whether to include thinking and redacted thinking blocks.
    pub show_thinking: bool,

    /// Whether to include tool invocations and their results.
    ///
    /// When disabled, searches, artifacts and code execution panels are
    /// omitted and only prose, images and sources remain.
    pub show_tools: bool,

    /// The initial color scheme.
    pub theme: Theme,

    /// Emit only the `<main>` conversation element instead of a full page.
    ///
    /// Useful for embedding in a page that supplies its own styles.
    pub fragment: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_thinking: true,
            show_tools: true,
            theme: Theme::Light,
            fragment: false,
        }
    }
}

/// Renders a whole conversation as HTML.
///
/// Messages are rendered in ascending `index` order regardless of the order
/// in the export; messages sharing an index keep their export order.
#[must_use]
pub fn render_conversation(
    conversation: &Conversation,
    attachments: &AttachmentMap,
    opts: &RenderOptions,
) -> String {
    let mut messages: Vec<&Message> = conversation.messages.iter().collect();
    messages.sort_by_key(|m| m.index);
    debug!(messages = messages.len(), "rendering conversation");

    let mut main = String::from("<main class=\"conversation\">\n");
    for message in messages {
        main.push_str(&render_message_with(message, attachments, opts));
        main.push('\n');
    }
    main.push_str("</main>");

    if opts.fragment {
        return main;
    }

    let title = conversation.name.as_deref().unwrap_or("Claude Conversation");
    let model = conversation.model.as_deref().unwrap_or("claude");
    let created = conversation
        .created_at
        .as_deref()
        .map(format_timestamp)
        .unwrap_or_default();

    let mut out = String::new();
    writeln!(out, "<!DOCTYPE html>").unwrap();
    writeln!(out, r#"<html lang="en" data-theme="{}">"#, opts.theme.as_str()).unwrap();
    writeln!(out, "<head>").unwrap();
    writeln!(out, r#"<meta charset="UTF-8">"#).unwrap();
    writeln!(
        out,
        r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#
    )
    .unwrap();
    writeln!(out, "<title>{}</title>", escape_text(title)).unwrap();
    writeln!(out, "<style>\n{STYLE}</style>").unwrap();
    writeln!(out, "</head>").unwrap();
    writeln!(out, "<body>").unwrap();
    render_header(&mut out, title, model, &created);
    writeln!(out, "{main}").unwrap();
    writeln!(out, "<script>\n{VIEWER_SCRIPT}</script>").unwrap();
    writeln!(out, "</body>").unwrap();
    writeln!(out, "</html>").unwrap();
    out
}

fn render_header(out: &mut String, title: &str, model: &str, created: &str) {
    let meta = if created.is_empty() {
        escape_text(model)
    } else {
        format!("{} &middot; {}", escape_text(model), escape_text(created))
    };

    writeln!(out, r#"<header class="page-header">"#).unwrap();
    writeln!(
        out,
        r#"<div class="header-left"><div class="claude-logo-header">{CLAUDE_LOGO}</div><div class="header-title"><h1>{}</h1><div class="header-meta">{meta}</div></div></div>"#,
        escape_text(title)
    )
    .unwrap();
    writeln!(out, r#"<div class="header-actions">"#).unwrap();
    writeln!(
        out,
        r#"<button id="expand-all-btn" title="Expand/Collapse all thinking"><svg width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><path d="M12 2a8 8 0 0 0-8 8c0 3.4 2.1 6.3 5 7.5V20a1 1 0 0 0 1 1h4a1 1 0 0 0 1-1v-2.5c2.9-1.2 5-4.1 5-7.5a8 8 0 0 0-8-8z"/></svg></button>"#
    )
    .unwrap();
    writeln!(
        out,
        r#"<button id="minimap-toggle" title="Toggle minimap"><svg width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><rect x="3" y="3" width="18" height="18" rx="2"/><line x1="3" y1="9" x2="21" y2="9"/><line x1="3" y1="15" x2="21" y2="15"/></svg></button>"#
    )
    .unwrap();
    writeln!(
        out,
        r#"<button id="theme-toggle" title="Toggle dark/light mode"><svg width="18" height="18" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2"><circle cx="12" cy="12" r="5"/><line x1="12" y1="1" x2="12" y2="3"/><line x1="12" y1="21" x2="12" y2="23"/><line x1="1" y1="12" x2="3" y2="12"/><line x1="21" y1="12" x2="23" y2="12"/></svg></button>"#
    )
    .unwrap();
    writeln!(out, "</div>\n</header>").unwrap();
    writeln!(
        out,
        r#"<div id="minimap" class="minimap"><div class="minimap-header"><span>Map</span><button id="minimap-close" title="Close minimap">&times;</button></div><div class="minimap-track" id="minimap-track"><div class="minimap-viewport" id="minimap-viewport"></div></div></div>"#
    )
    .unwrap();
}

/// Formats an RFC 3339 timestamp as `YYYY-MM-DD HH:MM UTC`.
///
/// Unparseable timestamps are shown as exported.
fn format_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw).map_or_else(
        |_| raw.to_owned(),
        |dt| {
            dt.with_timezone(&Utc)
                .format("%Y-%m-%d %H:%M UTC")
                .to_string()
        },
    )
}

/// Renders one message with default options.
///
/// `attachments` maps uploaded file UUIDs to data references. A file without
/// an entry is shown by name only; an empty map is always acceptable.
///
/// # Example
///
/// ```
/// use claude2html::parser::Message;
/// use claude2html::renderer::render_message;
/// use std::collections::HashMap;
///
/// let message = Message::from_value(&serde_json::json!({
///     "index": 0,
///     "sender": "human",
///     "text": "What is **Rust**?"
/// }));
///
/// let html = render_message(&message, &HashMap::new());
/// assert!(html.contains(r#"<div class="message message-human">"#));
/// assert!(html.contains("<strong>Rust</strong>"));
/// ```
#[must_use]
pub fn render_message(message: &Message, attachments: &AttachmentMap) -> String {
    render_message_with(message, attachments, &RenderOptions::default())
}

/// Renders one message honoring the given display options.
#[must_use]
pub fn render_message_with(
    message: &Message,
    attachments: &AttachmentMap,
    opts: &RenderOptions,
) -> String {
    let sender = message.sender.as_str();
    let (avatar, label) = match message.sender {
        Sender::Human => ("H", "You"),
        Sender::Assistant | Sender::Unknown => (CLAUDE_LOGO, "Claude"),
    };

    let content = if message.content.is_empty() {
        message
            .text
            .as_deref()
            .map(render_markdown)
            .unwrap_or_default()
    } else {
        render_blocks(&message.content, opts)
    };

    let mut out = String::new();
    writeln!(out, r#"<div class="message message-{sender}">"#).unwrap();
    writeln!(
        out,
        r#"<div class="message-avatar {sender}-avatar">{avatar}</div>"#
    )
    .unwrap();
    writeln!(out, r#"<div class="message-body">"#).unwrap();
    writeln!(out, r#"<div class="message-sender">{label}</div>"#).unwrap();
    render_files(&mut out, &message.files, attachments);
    for attachment in &message.attachments {
        render_text_attachment(&mut out, attachment);
    }
    writeln!(out, r#"<div class="message-content">{content}</div>"#).unwrap();
    writeln!(out, "</div>").unwrap();
    write!(out, "</div>").unwrap();
    out
}

fn render_files(out: &mut String, files: &[UploadedFile], attachments: &AttachmentMap) {
    if files.is_empty() {
        return;
    }

    writeln!(out, r#"<div class="uploaded-files-grid">"#).unwrap();
    for file in files {
        let data = file.uuid.as_ref().and_then(|uuid| attachments.get(uuid));
        let name = escape_text(&file.name);

        match (file.kind, data) {
            (FileKind::Image, Some(data)) => writeln!(
                out,
                r#"<div class="uploaded-file uploaded-image"><img src="{}" alt="{}" loading="lazy"><div class="uploaded-file-name">{name}</div></div>"#,
                escape_attr(data),
                escape_attr(&file.name)
            )
            .unwrap(),
            (FileKind::Document, data) => {
                let thumbnail = data
                    .map(|data| {
                        format!(
                            r#"<img class="doc-thumbnail" src="{}" alt="{}">"#,
                            escape_attr(data),
                            escape_attr(&file.name)
                        )
                    })
                    .unwrap_or_default();
                let pages = file
                    .page_count
                    .map(|n| format!(" ({n} page{})", if n == 1 { "" } else { "s" }))
                    .unwrap_or_default();
                writeln!(
                    out,
                    r#"<div class="uploaded-file uploaded-doc">{thumbnail}<div class="uploaded-file-info">{FILE_ICON}<span>{name}{pages}</span></div></div>"#
                )
                .unwrap();
            }
            (kind, _) => {
                if kind == FileKind::Image {
                    debug!(file = %file.name, "no resolved payload for uploaded image");
                }
                writeln!(
                    out,
                    r#"<div class="uploaded-file">{FILE_ICON}<span class="uploaded-file-name">{name}</span></div>"#
                )
                .unwrap();
            }
        }
    }
    writeln!(out, "</div>").unwrap();
}

fn render_text_attachment(out: &mut String, attachment: &TextAttachment) {
    let name = escape_text(&attachment.name);
    let size = attachment
        .size_bytes
        .map(|bytes| format!("({})", format_file_size(bytes)))
        .unwrap_or_default();

    match attachment.extracted_text.as_deref() {
        Some(text) => writeln!(
            out,
            r#"<details class="text-attachment"><summary>{FILE_ICON} {name} <span class="att-size">{size}</span></summary><div class="text-attachment-content"><pre>{}</pre></div></details>"#,
            escape_text(text)
        )
        .unwrap(),
        None => writeln!(
            out,
            r#"<div class="attachment">{ATTACHMENT_ICON} {name} <span class="att-size">{size}</span></div>"#
        )
        .unwrap(),
    }
}
