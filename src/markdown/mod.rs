//! Parsing of documentation sources.
//!
//! Sources are markdown files carrying reStructuredText-style directive
//! blocks and inline roles:
//!
//! ```text
//! .. urlinclude::
//!    :github: org/repo
//!    :branch: main
//!
//! .. literalinclude:: lib/mod.py
//!    :github: org/repo
//!    :language: python
//!
//! See :giturl:`the module <lib/mod.py>` on GitHub.
//! ```
//!
//! # Block Rules
//!
//! - A directive starts at a line `.. name:: [argument]` in the first column.
//! - It continues through the following lines that are indented and have the
//!   form `:key: value` (or a bare `:flag:`). A blank or unindented line ends it.
//! - An indented line that is not an option is a syntax error, as is a
//!   repeated option key.
//! - Fenced code blocks (```` ``` ```` or `~~~`) are copied verbatim; directives
//!   and roles inside them are not recognised.
//!
//! Everything else is text, in which [`find_roles`] locates role invocations.

pub mod writer;

use crate::core::UrlIncludeError;
use regex::Regex;
use std::sync::LazyLock;

static DIRECTIVE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\.\.\s+([A-Za-z][\w-]*)::(?:\s+(.*?))?\s*$").expect("directive header pattern is valid")
});

static DIRECTIVE_OPTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]+:([\w-]+):(?:\s+(.*?))?\s*$").expect("directive option pattern is valid")
});

static ROLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":([A-Za-z][\w-]*):`([^`]*)`").expect("role pattern is valid")
});

/// One `:key: value` line of a directive block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveOption {
    pub key: String,
    /// Empty for flag options
    pub value: String,
    pub line: usize,
}

/// A directive block as written in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBlock {
    pub name: String,
    /// Everything after `::` on the header line, if anything
    pub argument: Option<String>,
    pub options: Vec<DirectiveOption>,
    /// One-based line of the header
    pub line: usize,
}

/// A top-level piece of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Markdown text, possibly containing roles
    Text {
        content: String,
        /// One-based line of the first text line
        line: usize,
    },
    /// A fenced code block including its fences
    Fenced(String),
    Directive(DirectiveBlock),
}

/// A role invocation found in text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMatch<'a> {
    pub name: &'a str,
    /// Text between the backticks, still escaped
    pub text: &'a str,
    /// Byte range of the whole invocation
    pub start: usize,
    pub end: usize,
}

/// Splits a document into text, fenced code and directive blocks.
///
/// # Errors
///
/// Returns [`UrlIncludeError::DirectiveSyntax`] for malformed option lines and
/// repeated option keys.
pub fn parse_document(source: &str, docname: &str) -> Result<Vec<Block>, UrlIncludeError> {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let mut blocks = Vec::new();
    let mut text = String::new();
    let mut text_line = 1;
    let mut fenced = String::new();
    let mut fence: Option<(char, usize)> = None;

    let mut i = 0;
    while i < lines.len() {
        let raw = lines[i];
        let line = trim_eol(raw);

        if let Some((fence_char, fence_len)) = fence {
            fenced.push_str(raw);
            if closes_fence(line, fence_char, fence_len) {
                blocks.push(Block::Fenced(std::mem::take(&mut fenced)));
                fence = None;
            }
            i += 1;
            continue;
        }

        if let Some(open) = opening_fence(line) {
            flush_text(&mut blocks, &mut text, text_line);
            fence = Some(open);
            fenced.push_str(raw);
            i += 1;
            continue;
        }

        if let Some(caps) = DIRECTIVE_HEADER.captures(line) {
            flush_text(&mut blocks, &mut text, text_line);
            let mut block = DirectiveBlock {
                name: caps[1].to_string(),
                argument: caps.get(2).map(|m| m.as_str().to_string()).filter(|a| !a.is_empty()),
                options: Vec::new(),
                line: i + 1,
            };
            i += 1;

            while i < lines.len() {
                let option_line = trim_eol(lines[i]);
                if option_line.trim().is_empty() || !option_line.starts_with([' ', '\t']) {
                    break;
                }
                let Some(option) = DIRECTIVE_OPTION.captures(option_line) else {
                    return Err(UrlIncludeError::DirectiveSyntax {
                        docname: docname.to_string(),
                        line: i + 1,
                        message: format!(
                            "expected an option line ':key: value' in '{}' directive",
                            block.name
                        ),
                    });
                };
                let key = option[1].to_string();
                if block.options.iter().any(|o| o.key == key) {
                    return Err(UrlIncludeError::DirectiveSyntax {
                        docname: docname.to_string(),
                        line: i + 1,
                        message: format!("option ':{key}:' given more than once"),
                    });
                }
                block.options.push(DirectiveOption {
                    key,
                    value: option.get(2).map_or_else(String::new, |m| m.as_str().to_string()),
                    line: i + 1,
                });
                i += 1;
            }

            blocks.push(Block::Directive(block));
            continue;
        }

        if text.is_empty() {
            text_line = i + 1;
        }
        text.push_str(raw);
        i += 1;
    }

    // An unterminated fence runs to the end of the document
    if !fenced.is_empty() {
        blocks.push(Block::Fenced(fenced));
    }
    flush_text(&mut blocks, &mut text, text_line);

    Ok(blocks)
}

/// Finds role invocations `` :name:`text` `` in a text block.
#[must_use]
pub fn find_roles(text: &str) -> Vec<RoleMatch<'_>> {
    ROLE.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(RoleMatch {
                name: caps.get(1)?.as_str(),
                text: caps.get(2)?.as_str(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

fn flush_text(blocks: &mut Vec<Block>, text: &mut String, line: usize) {
    if !text.is_empty() {
        blocks.push(Block::Text {
            content: std::mem::take(text),
            line,
        });
    }
}

fn trim_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn opening_fence(line: &str) -> Option<(char, usize)> {
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let trimmed = &line[indent..];
    let fence_char = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.chars().take_while(|c| *c == fence_char).count();
    (len >= 3).then_some((fence_char, len))
}

fn closes_fence(line: &str, fence_char: char, fence_len: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= fence_len && trimmed.chars().all(|c| c == fence_char)
}
