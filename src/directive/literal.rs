//! Local literal includes rendered as fenced code blocks.

use super::{Directive, DirectiveInvocation, DirectiveSpec, Node};
use crate::build::DocContext;
use crate::core::UrlIncludeError;
use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Option selecting the code block language.
pub const LANGUAGE_OPTION: &str = "language";
/// Option adding a caption above the code block.
pub const CAPTION_OPTION: &str = "caption";

/// Reads a file relative to the document and renders it as a code block.
///
/// ```text
/// .. literalinclude:: ../examples/demo.py
///    :caption: Demo
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeBlockInclude;

#[async_trait]
impl Directive for CodeBlockInclude {
    fn name(&self) -> &str {
        "literalinclude"
    }

    fn spec(&self) -> DirectiveSpec {
        DirectiveSpec::new(1, 0).with_options(&[LANGUAGE_OPTION, CAPTION_OPTION])
    }

    async fn run(&self, invocation: DirectiveInvocation, ctx: &DocContext<'_>) -> Result<Vec<Node>> {
        let Some(argument) = invocation.arguments.first() else {
            return Err(UrlIncludeError::DirectiveSyntax {
                docname: ctx.docname.to_string(),
                line: invocation.line,
                message: "literalinclude needs a file path".to_string(),
            }
            .into());
        };

        let source = PathBuf::from(argument);
        let path = ctx.doc_dir().join(&source);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            UrlIncludeError::FileSystemError {
                operation: format!("including file in '{}'", ctx.docname),
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        let language = invocation
            .options
            .get(LANGUAGE_OPTION)
            .filter(|l| !l.is_empty())
            .cloned()
            .or_else(|| language_for(&source).map(str::to_string));
        let caption = invocation.options.get(CAPTION_OPTION).filter(|c| !c.is_empty()).cloned();

        Ok(vec![Node::Literal {
            language,
            content,
            caption,
            source,
        }])
    }
}

/// Code block language implied by a file extension.
#[must_use]
pub fn language_for(path: &Path) -> Option<&'static str> {
    let language = match path.extension()?.to_str()? {
        "py" => "python",
        "rs" => "rust",
        "toml" => "toml",
        "sh" | "bash" => "bash",
        "js" => "javascript",
        "ts" => "typescript",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "md" => "markdown",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" => "cpp",
        "go" => "go",
        _ => return None,
    };
    Some(language)
}
