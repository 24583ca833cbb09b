// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Convert exported Claude conversations to self-contained HTML.
//!
//! This crate provides parsing and rendering functionality for transforming
//! a Claude conversation record (as returned by the web app's conversation
//! API) into a single HTML page that can be opened offline.
//!
//! # Overview
//!
//! 1. [`parser`] reads the JSON record into typed messages and content blocks
//! 2. [`blocks`] renders each content block: prose, thinking, tool calls,
//!    search results, artifacts, code execution output and images
//! 3. [`markdown`] converts message text to HTML, using [`inline`] for
//!    emphasis and links and [`highlight`] for fenced code
//! 4. [`renderer`] assembles messages into the final page
//!
//! Rendering never fails. Unknown block types, tool names and languages
//! degrade to placeholders or plain output so that one odd block cannot
//! keep the rest of a conversation from rendering.
//!
//! # Example
//!
//! ```no_run
//! use claude2html::{parser, renderer};
//!
//! let json = std::fs::read_to_string("conversation.json").unwrap();
//! let conversation = parser::parse_conversation(&json).unwrap();
//!
//! let opts = renderer::RenderOptions {
//!     show_thinking: false,
//!     ..Default::default()
//! };
//!
//! let html = renderer::render_conversation(&conversation, &Default::default(), &opts);
//! std::fs::write("conversation.html", html).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`parser`]: JSON parsing and type definitions for conversation exports
//! - [`renderer`]: Page and message assembly with configurable output options
//! - [`blocks`]: Per-block HTML rendering
//! - [`markdown`]: Block-level markdown conversion
//! - [`inline`]: Inline emphasis and link formatting
//! - [`highlight`]: Lightweight syntax highlighting for code blocks
//! - [`escape`]: HTML escaping helpers

#![deny(missing_docs)]

pub mod blocks;
pub mod escape;
pub mod highlight;
pub mod inline;
pub mod markdown;
pub mod parser;
pub mod renderer;
