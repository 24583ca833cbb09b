// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! JSON parsing for exported Claude conversations.
//!
//! This module turns the conversation record returned by the Claude web
//! API (`chat_conversations/<id>?rendering_mode=messages`) into typed Rust
//! values. Parsing is deliberately lenient: every message and content block
//! is read through [`serde_json::Value`] path lookups, so missing fields fall
//! back to defaults and unknown block types become [`ContentBlock::Other`].
//! Only input that is not JSON, or whose root is not an object, is rejected.
//!
//! # Format Overview
//!
//! A conversation export contains:
//! - The conversation name, model and creation time
//! - `chat_messages`, each with an `index`, a `sender` and a `content` array
//! - Per-message uploaded `files`/`files_v2` and pasted `attachments`
//!
//! # Example
//!
//! ```
//! use claude2html::parser::{parse_conversation, ContentBlock, Sender};
//!
//! let json = r#"{
//!     "name": "Greeting",
//!     "chat_messages": [{
//!         "index": 0,
//!         "sender": "human",
//!         "content": [{ "type": "text", "text": "Hello" }]
//!     }]
//! }"#;
//!
//! let conversation = parse_conversation(json).unwrap();
//! assert_eq!(conversation.messages[0].sender, Sender::Human);
//! assert!(matches!(conversation.messages[0].content[0], ContentBlock::Text { .. }));
//! ```

use serde::Deserialize;
use serde_json::Value;
use snafu::prelude::*;
use std::collections::HashMap;

/// Error type for JSON parsing failures.
#[derive(Debug, Snafu)]
pub enum ParseError {
    /// Failed to parse JSON content.
    #[snafu(display("failed to parse JSON: {source}"))]
    Json {
        /// The underlying JSON parsing error.
        source: serde_json::Error,
    },

    /// The JSON root is not an object.
    #[snafu(display("expected a JSON object at the top level"))]
    NotAnObject,
}

/// Resolved binary payloads for uploaded files, keyed by file UUID.
///
/// Values are renderable data references, typically `data:` URIs. A file
/// whose UUID is missing from the map is shown by name only.
pub type AttachmentMap = HashMap<String, String>;

/// A whole exported conversation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Conversation {
    /// The conversation title, if it has one.
    pub name: Option<String>,

    /// The model identifier (e.g., "claude-sonnet-4").
    pub model: Option<String>,

    /// RFC 3339 creation timestamp as exported.
    pub created_at: Option<String>,

    /// The messages in export order, which is not necessarily `index` order.
    pub messages: Vec<Message>,
}

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    /// The person using the assistant.
    Human,
    /// The assistant.
    Assistant,
    /// A missing or unrecognized sender.
    Unknown,
}

impl Sender {
    /// Maps the export's `sender` string to a [`Sender`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "human" => Self::Human,
            "assistant" => Self::Assistant,
            _ => Self::Unknown,
        }
    }

    /// The sender name used in CSS class names (`message-<name>`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Human => "human",
            Self::Assistant => "assistant",
            Self::Unknown => "unknown",
        }
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Position of the message in the conversation.
    pub index: i64,

    /// Who sent the message.
    pub sender: Sender,

    /// Typed content blocks. Empty when the export only has plain text.
    pub content: Vec<ContentBlock>,

    /// Plain-text body, used when `content` is empty.
    pub text: Option<String>,

    /// Files uploaded with the message.
    pub files: Vec<UploadedFile>,

    /// Pasted text attachments.
    pub attachments: Vec<TextAttachment>,
}

/// The kind of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// An image shown as a thumbnail when resolved.
    Image,
    /// A document such as a PDF.
    Document,
    /// Anything else.
    Other,
}

/// A file uploaded alongside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Display file name.
    pub name: String,

    /// What kind of file this is.
    pub kind: FileKind,

    /// Identifier used to look up the resolved payload.
    pub uuid: Option<String>,

    /// Page count for documents, when known.
    pub page_count: Option<u64>,
}

/// A pasted text attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAttachment {
    /// Display file name.
    pub name: String,

    /// Full extracted text, when available.
    pub extracted_text: Option<String>,

    /// Size of the original file in bytes.
    pub size_bytes: Option<u64>,
}

/// One typed segment of message content.
///
/// Any block type not listed here parses as [`ContentBlock::Other`], which
/// keeps the original type tag for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// Markdown prose.
    Text {
        /// The markdown body.
        text: String,
    },

    /// A visible reasoning trace.
    Thinking {
        /// The markdown body of the reasoning.
        thinking: String,
    },

    /// A reasoning trace whose content was withheld.
    RedactedThinking,

    /// A tool invocation (`tool_use` or `server_tool_use`).
    ToolUse(ToolUse),

    /// The result of a tool invocation.
    ToolResult(ToolResult),

    /// Results of a server-side web search.
    WebSearchToolResult(WebSearchOutcome),

    /// A single search hit, usually nested inside a tool result.
    WebSearchResult(SearchResult),

    /// Output of a code-execution tool.
    CodeExecutionResult(CodeExecution),

    /// An inline image.
    Image(ImageSource),

    /// A cited source.
    Knowledge(Knowledge),

    /// An unrecognized block type.
    Other {
        /// The raw `type` tag, or `unknown` when absent.
        kind: String,
    },
}

/// A tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUse {
    /// Invocation identifier, referenced by the matching result.
    pub id: Option<String>,

    /// Tool name (e.g., `web_search`, `create_artifact`).
    pub name: String,

    /// The tool's input parameters.
    pub input: Value,

    /// A human-readable status line supplied by the service.
    pub message: Option<String>,
}

/// The result of a tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResult {
    /// Identifier of the invocation this result answers.
    pub tool_use_id: Option<String>,

    /// Tool name, when the export includes it.
    pub name: Option<String>,

    /// The result payload.
    pub content: ToolResultContent,

    /// Whether the tool reported an error.
    pub is_error: bool,

    /// Fallback status message.
    pub message: Option<String>,

    /// A `rich_link` display hint, converted to a source card.
    pub display_link: Option<Knowledge>,
}

/// The payload of a tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResultContent {
    /// Missing, null, an empty string or an empty array.
    Empty,
    /// A bare markdown string.
    Text(String),
    /// Nested content blocks.
    Blocks(Vec<ContentBlock>),
}

/// The payload of a web search tool result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebSearchOutcome {
    /// Search hits, in order.
    Results(Vec<SearchResult>),
    /// The search failed with this message.
    Error(String),
    /// Nothing usable.
    Empty,
}

/// A single web search hit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResult {
    /// Page URL.
    pub url: Option<String>,
    /// Page title.
    pub title: Option<String>,
    /// Human-readable page age (e.g., "2 days ago").
    pub page_age: Option<String>,
}

/// Output of a code-execution tool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeExecution {
    /// Standard output.
    pub output: Option<String>,
    /// The value of the final expression.
    pub return_value: Option<String>,
    /// Error output.
    pub error: Option<String>,
}

/// Where an image's pixels come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Inline base64 data.
    Base64 {
        /// MIME type (e.g., `image/png`).
        media_type: String,
        /// Base64-encoded bytes.
        data: String,
    },
    /// A remote or data URL.
    Url(String),
    /// No usable source.
    Missing,
}

/// A cited source with optional site metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Knowledge {
    /// Source title.
    pub title: String,
    /// Source URL, if it is linkable.
    pub url: Option<String>,
    /// Site display name.
    pub site_name: Option<String>,
    /// Site domain.
    pub site_domain: Option<String>,
    /// Favicon URL.
    pub favicon_url: Option<String>,
}

impl ContentBlock {
    /// The block's type tag as it appears in the export.
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Thinking { .. } => "thinking",
            Self::RedactedThinking => "redacted_thinking",
            Self::ToolUse(_) => "tool_use",
            Self::ToolResult(_) => "tool_result",
            Self::WebSearchToolResult(_) => "web_search_tool_result",
            Self::WebSearchResult(_) => "web_search_result",
            Self::CodeExecutionResult(_) => "code_execution_tool_result",
            Self::Image(_) => "image",
            Self::Knowledge(_) => "knowledge",
            Self::Other { kind } => kind,
        }
    }

    /// Builds a block from raw JSON. Never fails.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let kind = get_str(value, &["type"]).unwrap_or("unknown");
        match kind {
            "text" => Self::Text {
                text: get_string(value, &["text"]).unwrap_or_default(),
            },
            "thinking" => Self::Thinking {
                thinking: get_string(value, &["thinking"])
                    .or_else(|| get_string(value, &["text"]))
                    .unwrap_or_default(),
            },
            "redacted_thinking" => Self::RedactedThinking,
            "tool_use" | "server_tool_use" => Self::ToolUse(ToolUse {
                id: get_string(value, &["id"]),
                name: get_string(value, &["name"]).unwrap_or_else(|| "unknown".to_owned()),
                input: value
                    .get("input")
                    .filter(|input| !input.is_null())
                    .cloned()
                    .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
                message: non_empty(value, &["message"]),
            }),
            "tool_result" => Self::ToolResult(parse_tool_result(value)),
            "web_search_tool_result" => Self::WebSearchToolResult(parse_web_search(value)),
            "web_search_result" => Self::WebSearchResult(parse_search_result(value)),
            "code_execution_tool_result" => Self::CodeExecutionResult(CodeExecution {
                output: non_empty(value, &["output"])
                    .or_else(|| non_empty(value, &["content", "stdout"])),
                return_value: non_empty(value, &["return_value"])
                    .or_else(|| non_empty(value, &["content", "return_value"])),
                error: non_empty(value, &["error"])
                    .or_else(|| non_empty(value, &["content", "stderr"])),
            }),
            "image" => Self::Image(parse_image_source(value)),
            "knowledge" => Self::Knowledge(parse_knowledge(value)),
            other => Self::Other {
                kind: other.to_owned(),
            },
        }
    }
}

fn parse_tool_result(value: &Value) -> ToolResult {
    let content = match value.get("content") {
        Some(Value::String(s)) if !s.is_empty() => ToolResultContent::Text(s.clone()),
        Some(Value::Array(items)) if !items.is_empty() => {
            ToolResultContent::Blocks(items.iter().map(ContentBlock::from_value).collect())
        }
        Some(obj @ Value::Object(_)) => {
            ToolResultContent::Blocks(vec![ContentBlock::from_value(obj)])
        }
        _ => ToolResultContent::Empty,
    };

    let display_link = value
        .get("display_content")
        .filter(|hint| get_str(hint, &["type"]) == Some("rich_link"))
        .and_then(|hint| hint.get("link"))
        .map(|link| Knowledge {
            title: get_string(link, &["title"]).unwrap_or_else(|| "Source".to_owned()),
            url: non_empty(link, &["url"]),
            site_name: non_empty(link, &["source"]),
            site_domain: None,
            favicon_url: non_empty(link, &["icon_url"]),
        });

    ToolResult {
        tool_use_id: get_string(value, &["tool_use_id"]),
        name: non_empty(value, &["name"]),
        content,
        is_error: value
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        message: non_empty(value, &["message"]),
        display_link,
    }
}

fn parse_web_search(value: &Value) -> WebSearchOutcome {
    match value.get("content") {
        Some(Value::Array(items)) => WebSearchOutcome::Results(
            items
                .iter()
                .filter(|item| get_str(item, &["type"]) == Some("web_search_result"))
                .map(parse_search_result)
                .collect(),
        ),
        Some(content @ Value::Object(_))
            if matches!(
                get_str(content, &["type"]),
                Some("web_search_tool_result_error" | "web_search_error")
            ) =>
        {
            WebSearchOutcome::Error(
                non_empty(content, &["error_message"])
                    .or_else(|| non_empty(content, &["error_code"]))
                    .unwrap_or_else(|| "Unknown error".to_owned()),
            )
        }
        _ => WebSearchOutcome::Empty,
    }
}

fn parse_search_result(value: &Value) -> SearchResult {
    SearchResult {
        url: non_empty(value, &["url"]),
        title: non_empty(value, &["title"]),
        page_age: non_empty(value, &["page_age"]),
    }
}

fn parse_image_source(value: &Value) -> ImageSource {
    let Some(source) = value.get("source") else {
        return ImageSource::Missing;
    };
    if get_str(source, &["type"]) == Some("base64") {
        return non_empty(source, &["data"]).map_or(ImageSource::Missing, |data| {
            ImageSource::Base64 {
                media_type: non_empty(source, &["media_type"])
                    .unwrap_or_else(|| "image/png".to_owned()),
                data,
            }
        });
    }
    non_empty(source, &["url"]).map_or(ImageSource::Missing, ImageSource::Url)
}

fn parse_knowledge(value: &Value) -> Knowledge {
    Knowledge {
        title: non_empty(value, &["title"])
            .or_else(|| non_empty(value, &["name"]))
            .unwrap_or_else(|| "Source".to_owned()),
        url: non_empty(value, &["url"]),
        site_name: non_empty(value, &["metadata", "site_name"]),
        site_domain: non_empty(value, &["metadata", "site_domain"]),
        favicon_url: non_empty(value, &["metadata", "favicon_url"]),
    }
}

impl Message {
    /// Builds a message from raw JSON. Never fails.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let content = value
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| blocks.iter().map(ContentBlock::from_value).collect())
            .unwrap_or_default();

        // `files_v2` wins whenever present, even if empty.
        let files = value
            .get("files_v2")
            .and_then(Value::as_array)
            .or_else(|| value.get("files").and_then(Value::as_array))
            .map(|files| files.iter().map(parse_file).collect())
            .unwrap_or_default();

        let attachments = value
            .get("attachments")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(parse_attachment).collect())
            .unwrap_or_default();

        Self {
            index: value.get("index").and_then(Value::as_i64).unwrap_or(0),
            sender: Sender::parse(get_str(value, &["sender"]).unwrap_or_default()),
            content,
            text: non_empty(value, &["text"]),
            files,
            attachments,
        }
    }
}

fn parse_file(value: &Value) -> UploadedFile {
    UploadedFile {
        name: non_empty(value, &["file_name"]).unwrap_or_else(|| "file".to_owned()),
        kind: match get_str(value, &["file_kind"]) {
            Some("image") => FileKind::Image,
            Some("document") => FileKind::Document,
            _ => FileKind::Other,
        },
        uuid: non_empty(value, &["file_uuid"]),
        page_count: value
            .get("document_asset")
            .and_then(|asset| asset.get("page_count"))
            .and_then(Value::as_u64),
    }
}

fn parse_attachment(value: &Value) -> TextAttachment {
    TextAttachment {
        name: non_empty(value, &["file_name"])
            .or_else(|| non_empty(value, &["filename"]))
            .unwrap_or_else(|| "attachment".to_owned()),
        extracted_text: non_empty(value, &["extracted_content"]),
        size_bytes: value.get("file_size").and_then(Value::as_u64),
    }
}

impl<'de> Deserialize<'de> for Conversation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self {
            name: non_empty(&value, &["name"]),
            model: non_empty(&value, &["model"]),
            created_at: non_empty(&value, &["created_at"]),
            messages: value
                .get("chat_messages")
                .and_then(Value::as_array)
                .map(|messages| messages.iter().map(Message::from_value).collect())
                .unwrap_or_default(),
        })
    }
}

/// Navigates a JSON path and returns the string value at the end.
///
/// # Arguments
///
/// * `value` - The root JSON value to navigate from
/// * `path` - A sequence of keys to follow through the JSON structure
fn get_str<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str()
}

/// Like [`get_str`] but returns an owned `String`.
fn get_string(value: &Value, path: &[&str]) -> Option<String> {
    get_str(value, path).map(str::to_owned)
}

/// Like [`get_string`] but treats an empty string as absent.
fn non_empty(value: &Value, path: &[&str]) -> Option<String> {
    get_str(value, path)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Parses a JSON string into a [`Conversation`].
///
/// # Errors
///
/// Returns an error if the input is not valid JSON or its root is not an
/// object. Everything inside the object is parsed leniently.
///
/// # Example
///
/// ```
/// use claude2html::parser::parse_conversation;
///
/// let conversation = parse_conversation(r#"{"name": "Empty"}"#).unwrap();
/// assert_eq!(conversation.name.as_deref(), Some("Empty"));
/// assert!(conversation.messages.is_empty());
/// ```
pub fn parse_conversation(json_str: &str) -> Result<Conversation, ParseError> {
    let value: Value = serde_json::from_str(json_str).context(JsonSnafu)?;
    ensure!(value.is_object(), NotAnObjectSnafu);
    serde_json::from_value(value).context(JsonSnafu)
}

/// Parses a JSON object of file UUIDs to data references.
///
/// `null` values mark files that could not be resolved and are dropped.
///
/// # Errors
///
/// Returns an error if the input is not a JSON object of strings or nulls.
pub fn parse_attachment_map(json_str: &str) -> Result<AttachmentMap, ParseError> {
    let raw: HashMap<String, Option<String>> =
        serde_json::from_str(json_str).context(JsonSnafu)?;
    Ok(raw
        .into_iter()
        .filter_map(|(uuid, data)| data.map(|data| (uuid, data)))
        .collect())
}
