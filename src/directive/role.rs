//! The `giturl` role.

use super::{Node, Role};
use crate::build::DocContext;
use crate::core::UrlIncludeError;
use crate::reference::{Override, ReferenceResolver};
use anyhow::Result;

/// Links to a file in the document's GitHub repository.
///
/// ```text
/// :giturl:`path/to/file.py`              -> [path/to/file.py](https://github.com/org/repo/blob/master/path/to/file.py)
/// :giturl:`See this <path/to/file.py>`   -> [See this](https://github.com/org/repo/blob/master/path/to/file.py)
/// ```
///
/// The repository and branch come from the document's `urlinclude` override.
#[derive(Debug, Clone)]
pub struct GitUrlRole {
    resolver: ReferenceResolver,
}

impl GitUrlRole {
    #[must_use]
    pub fn new(resolver: ReferenceResolver) -> Self {
        Self {
            resolver,
        }
    }
}

impl Role for GitUrlRole {
    fn name(&self) -> &str {
        "giturl"
    }

    fn run(&self, text: &str, line: usize, ctx: &DocContext<'_>) -> Result<Vec<Node>> {
        let (title, target) = split_explicit_title(text);
        let target = unescape(target);
        let title = title.map_or_else(|| target.clone(), unescape);

        let defaults = ctx.document_override();
        let uri = self
            .resolver
            .link_url(defaults.as_ref(), &Override::default(), &target)
            .map_err(|reason| UrlIncludeError::ReferenceConfig {
                docname: ctx.docname.to_string(),
                line,
                reason,
            })?;

        Ok(vec![Node::Reference {
            title,
            uri,
        }])
    }
}

/// Splits `title <target>` into its parts.
///
/// The target starts at the first unescaped `<` that follows a non-empty
/// title. Returns `(None, text)` when there is no explicit title.
///
/// ```rust
/// use urlinclude::directive::split_explicit_title;
///
/// assert_eq!(split_explicit_title("See this <a/b.py>"), (Some("See this"), "a/b.py"));
/// assert_eq!(split_explicit_title("a/b.py"), (None, "a/b.py"));
/// assert_eq!(split_explicit_title(r"x \<y>"), (None, r"x \<y>"));
/// ```
#[must_use]
pub fn split_explicit_title(text: &str) -> (Option<&str>, &str) {
    let Some(body) = text.strip_suffix('>') else {
        return (None, text);
    };

    let bytes = body.as_bytes();
    (0..bytes.len())
        .filter(|&i| bytes[i] == b'<' && !is_escaped(bytes, i))
        .map(|open| (body[..open].trim_end(), open))
        .find(|(title, _)| !title.is_empty())
        .map_or((None, text), |(title, open)| (Some(title), &body[open + 1..]))
}

/// Removes backslash escapes: `\x` becomes `x`.
///
/// ```rust
/// use urlinclude::directive::unescape;
///
/// assert_eq!(unescape(r"a\<b\\c"), r"a<b\c");
/// ```
#[must_use]
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// True when the byte at `index` is preceded by an odd number of backslashes.
fn is_escaped(bytes: &[u8], index: usize) -> bool {
    bytes[..index].iter().rev().take_while(|b| **b == b'\\').count() % 2 == 1
}
