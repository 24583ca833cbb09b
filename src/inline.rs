// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Inline formatting for a single line of escaped markdown text.
//!
//! The formatter runs a fixed sequence of rewrite passes over the line:
//! bold+italic, bold, italic, strikethrough and finally links. Each pass
//! scans the output of the previous one left to right, so nested or
//! overlapping markers resolve the way a single regex scan picks them.
//!
//! # Example
//!
//! ```
//! use claude2html::inline::format_inline;
//!
//! assert_eq!(format_inline("**bold** and *em*"), "<strong>bold</strong> and <em>em</em>");
//! ```

use crate::markdown::is_placeholder_marker;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// An emphasis rewrite: a pattern and its replacement template.
struct Pass {
    pattern: &'static str,
    replacement: &'static str,
}

const EMPHASIS_PASSES: &[Pass] = &[
    Pass {
        pattern: r"\*\*\*(.+?)\*\*\*",
        replacement: "<strong><em>${1}</em></strong>",
    },
    Pass {
        pattern: r"___(.+?)___",
        replacement: "<strong><em>${1}</em></strong>",
    },
    Pass {
        pattern: r"\*\*(.+?)\*\*",
        replacement: "<strong>${1}</strong>",
    },
    Pass {
        pattern: r"__(.+?)__",
        replacement: "<strong>${1}</strong>",
    },
    Pass {
        pattern: r"\*(.+?)\*",
        replacement: "<em>${1}</em>",
    },
    Pass {
        pattern: r"_(.+?)_",
        replacement: "<em>${1}</em>",
    },
    Pass {
        pattern: r"~~(.+?)~~",
        replacement: "<del>${1}</del>",
    },
];

fn emphasis_regexes() -> &'static [Regex] {
    static REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
    REGEXES.get_or_init(|| {
        EMPHASIS_PASSES
            .iter()
            .map(|pass| Regex::new(pass.pattern).expect("valid emphasis regex"))
            .collect()
    })
}

fn link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").expect("valid link regex"))
}

fn script_scheme_regex() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"(?i)^\s*javascript:").expect("valid scheme regex"))
}

/// Returns `true` for URLs using the `javascript:` scheme, ignoring case and
/// leading whitespace.
#[must_use]
pub fn is_script_url(url: &str) -> bool {
    script_scheme_regex().is_match(url)
}

/// Applies emphasis, strikethrough and link formatting to one line.
///
/// The input must already be escaped for `&`, `<` and `>`; no further
/// escaping is performed except for double quotes inside link targets.
///
/// Links whose target uses the `javascript:` scheme are reduced to their
/// text, and links whose target contains a protected code span are left as
/// written. Every other link opens in a new browsing context.
#[must_use]
pub fn format_inline(line: &str) -> String {
    let mut text = line.to_owned();
    for (pass, re) in EMPHASIS_PASSES.iter().zip(emphasis_regexes()) {
        text = re.replace_all(&text, pass.replacement).into_owned();
    }

    link_regex()
        .replace_all(&text, |caps: &Captures<'_>| {
            let label = &caps[1];
            let target = &caps[2];
            if target.chars().any(is_placeholder_marker) {
                return caps[0].to_owned();
            }
            if is_script_url(target) {
                return label.to_owned();
            }
            format!(
                r#"<a href="{}" target="_blank" rel="noopener">{label}</a>"#,
                target.replace('"', "&quot;")
            )
        })
        .into_owned()
}
