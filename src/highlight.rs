// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Brian Hetro <whee@smaertness.net>

//! Best-effort syntax highlighting for fenced code.
//!
//! The tokenizer is not a lexer for any particular language. At each
//! position it tries, in order: a line comment, a block comment, a string
//! literal, a number and a keyword from the language's table. When nothing
//! matches, one character is emitted as plain text. The spans always cover
//! the input exactly, so malformed code only loses highlighting.
//!
//! Input is expected to be HTML-escaped already; span text is emitted as is.

use std::fmt::Write;
use tracing::debug;

/// Classification of a highlighted span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A `//`, `#` or `/* */` comment.
    Comment,
    /// A single, double or back-quoted string literal.
    String,
    /// A numeric literal.
    Number,
    /// A reserved word of the language.
    Keyword,
    /// Anything else.
    Plain,
}

impl Category {
    /// The CSS class used for this category, or `None` for plain text.
    #[must_use]
    pub const fn css_class(self) -> Option<&'static str> {
        match self {
            Self::Comment => Some("hl-comment"),
            Self::String => Some("hl-string"),
            Self::Number => Some("hl-number"),
            Self::Keyword => Some("hl-keyword"),
            Self::Plain => None,
        }
    }
}

/// A classified slice of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan<'a> {
    /// What the span was recognized as.
    pub category: Category,
    /// The exact input text covered by the span.
    pub text: &'a str,
}

const JS_KEYWORDS: &[&str] = &[
    "const", "let", "var", "function", "return", "if", "else", "for", "while", "class", "import",
    "export", "from", "default", "async", "await", "new", "try", "catch", "throw", "typeof",
    "instanceof", "in", "of", "switch", "case", "break", "continue", "do", "this", "super",
    "extends", "yield", "delete", "void", "null", "undefined", "true", "false",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "def", "class", "if", "elif", "else", "for", "while", "import", "from", "return", "try",
    "except", "raise", "with", "as", "in", "not", "and", "or", "is", "None", "True", "False",
    "self", "lambda", "yield", "pass", "break", "continue", "global", "nonlocal", "async",
    "await", "print",
];

const BASH_KEYWORDS: &[&str] = &[
    "if", "then", "else", "fi", "for", "do", "done", "while", "case", "esac", "function",
    "return", "echo", "exit", "export", "source", "local", "readonly", "declare", "set", "unset",
    "cd", "ls", "grep", "awk", "sed", "cat", "mkdir", "rm", "cp", "mv", "chmod", "chown",
];

const GENERIC_KEYWORDS: &[&str] = &[
    "function", "return", "if", "else", "for", "while", "class", "import", "export", "const",
    "let", "var", "new", "try", "catch", "throw", "true", "false", "null", "void", "this",
    "async", "await", "def", "self", "None", "print",
];

/// Canonical language name and its reserved words.
const LANGUAGES: &[(&str, &[&str])] = &[
    ("js", JS_KEYWORDS),
    ("python", PYTHON_KEYWORDS),
    ("bash", BASH_KEYWORDS),
];

/// Alternate spellings folded onto a canonical language name.
const ALIASES: &[(&str, &str)] = &[
    ("javascript", "js"),
    ("typescript", "js"),
    ("ts", "js"),
    ("jsx", "js"),
    ("tsx", "js"),
    ("py", "python"),
    ("sh", "bash"),
    ("shell", "bash"),
    ("zsh", "bash"),
];

/// Returns `true` when the language tag disables highlighting.
fn is_plain_language(lang: &str) -> bool {
    lang.is_empty()
        || lang.eq_ignore_ascii_case("text")
        || lang.eq_ignore_ascii_case("plaintext")
}

/// Looks up the keyword table for a language tag, falling back to the
/// generic table for anything unrecognized.
fn keywords_for(lang: &str) -> &'static [&'static str] {
    let lang = lang.to_ascii_lowercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == lang)
        .map_or(lang.as_str(), |(_, name)| *name);

    LANGUAGES
        .iter()
        .find(|(name, _)| *name == canonical)
        .map_or_else(
            || {
                debug!(lang = %canonical, "no keyword table for language, using generic set");
                GENERIC_KEYWORDS
            },
            |(_, words)| *words,
        )
}

const fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Splits `code` into classified spans.
///
/// The concatenation of every span's text is always equal to `code`.
/// Adjacent plain characters are merged into a single span.
#[must_use]
pub fn tokenize<'a>(code: &'a str, lang: &str) -> Vec<TokenSpan<'a>> {
    if code.is_empty() {
        return Vec::new();
    }
    if is_plain_language(lang) {
        return vec![TokenSpan {
            category: Category::Plain,
            text: code,
        }];
    }

    let keywords = keywords_for(lang);
    let bytes = code.as_bytes();
    let mut spans: Vec<TokenSpan<'a>> = Vec::new();
    let mut plain_start: Option<usize> = None;
    let mut pos = 0;

    while pos < code.len() {
        let rest = &code[pos..];
        let after_word = pos > 0 && is_word_byte(bytes[pos - 1]);

        let matched = line_comment(rest)
            .or_else(|| block_comment(rest))
            .map(|len| (Category::Comment, len))
            .or_else(|| string_literal(rest).map(|len| (Category::String, len)))
            .or_else(|| {
                if after_word {
                    return None;
                }
                number(rest)
                    .map(|len| (Category::Number, len))
                    .or_else(|| word(rest, keywords))
            });

        match matched {
            Some((category, len)) if category != Category::Plain => {
                if let Some(start) = plain_start.take() {
                    spans.push(TokenSpan {
                        category: Category::Plain,
                        text: &code[start..pos],
                    });
                }
                spans.push(TokenSpan {
                    category,
                    text: &code[pos..pos + len],
                });
                pos += len;
            }
            Some((_, len)) => {
                plain_start.get_or_insert(pos);
                pos += len;
            }
            None => {
                plain_start.get_or_insert(pos);
                pos += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if let Some(start) = plain_start {
        spans.push(TokenSpan {
            category: Category::Plain,
            text: &code[start..],
        });
    }
    spans
}

/// Highlights `code` as markup, one `<span>` per classified token.
///
/// Plain-text language tags (empty, `text`, `plaintext`) return the code
/// unchanged.
///
/// # Example
///
/// ```
/// use claude2html::highlight::highlight;
///
/// assert_eq!(
///     highlight("return 1", "js"),
///     r#"<span class="hl-keyword">return</span> <span class="hl-number">1</span>"#
/// );
/// assert_eq!(highlight("return 1", "text"), "return 1");
/// ```
#[must_use]
pub fn highlight(code: &str, lang: &str) -> String {
    if is_plain_language(lang) {
        return code.to_owned();
    }

    let mut out = String::with_capacity(code.len() * 2);
    for span in tokenize(code, lang) {
        match span.category.css_class() {
            Some(class) => write!(out, r#"<span class="{class}">{}</span>"#, span.text).unwrap(),
            None => out.push_str(span.text),
        }
    }
    out
}

/// `//` to end of line, or `#` to end of line unless it starts a `#!` line.
fn line_comment(rest: &str) -> Option<usize> {
    let is_comment =
        rest.starts_with("//") || (rest.starts_with('#') && !rest.starts_with("#!"));
    is_comment.then(|| rest.find('\n').unwrap_or(rest.len()))
}

/// The shortest `/* ... */` span; unterminated comments do not match.
fn block_comment(rest: &str) -> Option<usize> {
    if !rest.starts_with("/*") {
        return None;
    }
    rest[2..].find("*/").map(|end| end + 4)
}

/// A quoted string where a backslash escapes the following character.
///
/// Unterminated strings, and escapes of a line break, do not match.
fn string_literal(rest: &str) -> Option<usize> {
    let quote = rest.as_bytes().first().copied()?;
    if !matches!(quote, b'"' | b'\'' | b'`') {
        return None;
    }

    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some((_, '\n' | '\r')) | None => return None,
                Some(_) => {}
            }
        } else if c as u32 == u32::from(quote) {
            return Some(i + 1);
        }
    }
    None
}

/// Digits, an optional fraction and an optional exponent, not followed by a
/// word character.
fn number(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut len = digits(0);
    if len == 0 {
        return None;
    }
    if bytes.get(len) == Some(&b'.') {
        len += 1;
        len += digits(len);
    }
    if bytes.get(len) == Some(&b'e') {
        let mut exp = len + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = digits(exp);
        if exp_digits > 0 {
            len = exp + exp_digits;
        }
    }

    match bytes.get(len) {
        Some(&b) if is_word_byte(b) => None,
        _ => Some(len),
    }
}

/// A whole identifier-like word, classified as keyword or plain.
fn word(rest: &str, keywords: &[&str]) -> Option<(Category, usize)> {
    let len = rest.bytes().take_while(|&b| is_word_byte(b)).count();
    if len == 0 {
        return None;
    }
    let category = if keywords.contains(&&rest[..len]) {
        Category::Keyword
    } else {
        Category::Plain
    };
    Some((category, len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories<'a>(code: &'a str, lang: &str) -> Vec<(Category, &'a str)> {
        tokenize(code, lang)
            .into_iter()
            .map(|s| (s.category, s.text))
            .collect()
    }

    fn reassemble(code: &str, lang: &str) -> String {
        tokenize(code, lang).iter().map(|s| s.text).collect()
    }

    #[test]
    fn plain_languages_are_identity() {
        for lang in ["", "text", "plaintext"] {
            assert_eq!(highlight("if (x) { return 1; }", lang), "if (x) { return 1; }");
        }
    }

    #[test]
    fn plain_language_tags_ignore_case() {
        for lang in ["Text", "PLAINTEXT", "PlainText"] {
            assert_eq!(highlight("return 1", lang), "return 1");
        }
    }

    #[test]
    fn highlights_js_keywords() {
        assert_eq!(
            categories("const x", "javascript"),
            vec![(Category::Keyword, "const"), (Category::Plain, " x")]
        );
    }

    #[test]
    fn does_not_highlight_keywords_inside_words() {
        assert_eq!(categories("constant", "js"), vec![(Category::Plain, "constant")]);
        assert_eq!(categories("xif", "js"), vec![(Category::Plain, "xif")]);
    }

    #[test]
    fn does_not_highlight_inside_strings() {
        assert_eq!(
            categories(r#""if return" + 1"#, "js"),
            vec![
                (Category::String, r#""if return""#),
                (Category::Plain, " + "),
                (Category::Number, "1"),
            ]
        );
    }

    #[test]
    fn escaped_quote_does_not_end_string() {
        assert_eq!(
            categories(r#"'it\'s' x"#, "py"),
            vec![(Category::String, r"'it\'s'"), (Category::Plain, " x")]
        );
    }

    #[test]
    fn unterminated_string_degrades_to_plain() {
        let spans = categories(r#""open"#, "js");
        assert!(spans.iter().all(|(c, _)| *c == Category::Plain));
        assert_eq!(reassemble(r#""open"#, "js"), r#""open"#);
    }

    #[test]
    fn highlights_line_comments() {
        assert_eq!(
            categories("x // note\ny", "js"),
            vec![
                (Category::Plain, "x "),
                (Category::Comment, "// note"),
                (Category::Plain, "\ny"),
            ]
        );
        assert_eq!(categories("# note", "python")[0], (Category::Comment, "# note"));
    }

    #[test]
    fn shebang_is_not_a_comment() {
        let spans = categories("#!/bin/sh", "bash");
        assert!(spans.iter().all(|(c, _)| *c != Category::Comment));
    }

    #[test]
    fn block_comment_is_shortest_match() {
        assert_eq!(
            categories("/* a */ 1 /* b */", "c"),
            vec![
                (Category::Comment, "/* a */"),
                (Category::Plain, " "),
                (Category::Number, "1"),
                (Category::Plain, " "),
                (Category::Comment, "/* b */"),
            ]
        );
    }

    #[test]
    fn block_comment_spans_lines() {
        assert_eq!(categories("/* a\nb */", "js"), vec![(Category::Comment, "/* a\nb */")]);
    }

    #[test]
    fn highlights_numbers_with_fraction_and_exponent() {
        assert_eq!(categories("1.5e-3", "js"), vec![(Category::Number, "1.5e-3")]);
        assert_eq!(categories("42", "js"), vec![(Category::Number, "42")]);
    }

    #[test]
    fn digits_inside_identifiers_are_plain() {
        assert_eq!(categories("x1 2x", "js"), vec![(Category::Plain, "x1 2x")]);
    }

    #[test]
    fn aliases_select_language_tables() {
        assert_eq!(categories("elif", "py")[0].0, Category::Keyword);
        assert_eq!(categories("esac", "zsh")[0].0, Category::Keyword);
        assert_eq!(categories("yield", "tsx")[0].0, Category::Keyword);
    }

    #[test]
    fn unknown_language_uses_generic_table() {
        assert_eq!(categories("return", "cobol")[0].0, Category::Keyword);
        assert_eq!(categories("esac", "cobol")[0].0, Category::Plain);
    }

    #[test]
    fn spans_cover_input_exactly() {
        let samples = [
            "fn main() { let s = \"héllo\"; // ünïcode\n}",
            "/* open comment",
            "'a\\\nb'",
            "x = `tmpl ${1}` + 0.5e",
            "&lt;div&gt; &amp;&amp; # tail",
            "\\",
            "日本語 if 3",
        ];
        for code in samples {
            for lang in ["js", "python", "bash", "rust", "text", ""] {
                assert_eq!(reassemble(code, lang), code, "lang {lang:?}");
            }
        }
    }

    #[test]
    fn empty_code_yields_no_spans() {
        assert!(tokenize("", "js").is_empty());
        assert_eq!(highlight("", "js"), "");
    }
}
