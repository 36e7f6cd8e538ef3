//! Dispatching parsed documents to directives and roles.

use super::{
    CodeBlockInclude, Directive, DirectiveInvocation, DirectiveSpec, GitUrlRole, Options, Role,
    UrlIncludeConfig, UrlLiteralInclude,
};
use crate::build::DocContext;
use crate::cache::ContentCache;
use crate::core::UrlIncludeError;
use crate::markdown::writer::{render_block, render_inline};
use crate::markdown::{Block, DirectiveBlock, find_roles, parse_document};
use crate::reference::ReferenceResolver;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Registry of directives and roles that renders whole documents.
///
/// Unknown directives are errors. Unknown roles are left in the text as
/// written, since a role-like span may just be prose.
#[derive(Default)]
pub struct DocumentProcessor {
    directives: HashMap<String, Arc<dyn Directive>>,
    roles: HashMap<String, Arc<dyn Role>>,
}

impl DocumentProcessor {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in handlers: `urlinclude`, remote-capable `literalinclude`
    /// and `giturl`.
    #[must_use]
    pub fn standard(cache: ContentCache, resolver: ReferenceResolver) -> Self {
        Self::new()
            .with_directive(UrlIncludeConfig)
            .with_directive(UrlLiteralInclude::new(CodeBlockInclude, cache, resolver.clone()))
            .with_role(GitUrlRole::new(resolver))
    }

    /// Registers a directive, replacing one with the same name.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Directive + 'static) -> Self {
        self.directives.insert(directive.name().to_string(), Arc::new(directive));
        self
    }

    /// Registers a role, replacing one with the same name.
    #[must_use]
    pub fn with_role(mut self, role: impl Role + 'static) -> Self {
        self.roles.insert(role.name().to_string(), Arc::new(role));
        self
    }

    /// Renders a document source.
    ///
    /// Directive blocks are replaced by their rendered nodes, roles in text are
    /// replaced inline, fenced code is copied unchanged. Blocks are processed in
    /// document order, so a `urlinclude` directive applies to everything after it.
    ///
    /// # Errors
    ///
    /// Fails on the first directive or role error.
    pub async fn process(&self, source: &str, ctx: &DocContext<'_>) -> Result<String> {
        let mut out = String::with_capacity(source.len());

        for block in parse_document(source, ctx.docname)? {
            match block {
                Block::Text {
                    content,
                    line,
                } => out.push_str(&self.expand_roles(&content, line, ctx)?),
                Block::Fenced(content) => out.push_str(&content),
                Block::Directive(block) => {
                    let directive = self.directives.get(&block.name).ok_or_else(|| {
                        UrlIncludeError::UnknownDirective {
                            name: block.name.clone(),
                            docname: ctx.docname.to_string(),
                            line: block.line,
                        }
                    })?;
                    let invocation = prepare_invocation(block, &directive.spec(), ctx.docname)?;
                    trace!("'{}' line {}: running {}", ctx.docname, invocation.line, invocation.name);
                    let nodes = directive.run(invocation, ctx).await?;
                    out.push_str(&render_block(&nodes));
                }
            }
        }

        Ok(out)
    }

    fn expand_roles(&self, text: &str, first_line: usize, ctx: &DocContext<'_>) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        for found in find_roles(text) {
            let Some(role) = self.roles.get(found.name) else {
                continue;
            };
            let line = first_line + text[..found.start].matches('\n').count();
            let nodes = role.run(found.text, line, ctx)?;
            out.push_str(&text[last..found.start]);
            out.push_str(&render_inline(&nodes));
            last = found.end;
        }

        out.push_str(&text[last..]);
        Ok(out)
    }
}

/// Splits the argument and validates options against `spec`.
fn prepare_invocation(
    block: DirectiveBlock,
    spec: &DirectiveSpec,
    docname: &str,
) -> Result<DirectiveInvocation, UrlIncludeError> {
    let syntax_error = |message: String| UrlIncludeError::DirectiveSyntax {
        docname: docname.to_string(),
        line: block.line,
        message,
    };

    let arguments = split_arguments(block.argument.as_deref().unwrap_or_default(), spec.max_arguments());
    if arguments.len() < spec.required_arguments {
        return Err(syntax_error(format!(
            "'{}' needs {} argument(s), got {}",
            block.name,
            spec.required_arguments,
            arguments.len()
        )));
    }
    if spec.max_arguments() == 0 && block.argument.is_some() {
        return Err(syntax_error(format!("'{}' takes no arguments", block.name)));
    }

    let mut options = Options::new();
    for option in block.options {
        if !spec.accepts(&option.key) {
            return Err(UrlIncludeError::UnknownOption {
                directive: block.name.clone(),
                option: option.key,
                docname: docname.to_string(),
                line: option.line,
            });
        }
        options.insert(option.key, option.value);
    }

    Ok(DirectiveInvocation {
        name: block.name,
        arguments,
        options,
        line: block.line,
    })
}

/// Splits on whitespace into at most `max` arguments; the last one keeps any
/// remaining whitespace.
fn split_arguments(raw: &str, max: usize) -> Vec<String> {
    let mut arguments = Vec::new();
    let mut rest = raw.trim();
    while !rest.is_empty() && arguments.len() < max {
        if arguments.len() + 1 == max {
            arguments.push(rest.to_string());
            break;
        }
        match rest.split_once(char::is_whitespace) {
            Some((head, tail)) => {
                arguments.push(head.to_string());
                rest = tail.trim_start();
            }
            None => {
                arguments.push(rest.to_string());
                break;
            }
        }
    }
    arguments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildContext;
    use crate::cache::url_digest;
    use crate::config::ProjectConfig;
    use crate::test_utils::CountingFetcher;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const RAW_URL: &str = "https://github.com/org/repo/raw/v2/lib/mod.py";

    struct Fixture {
        temp: TempDir,
        build: BuildContext,
        fetcher: Arc<CountingFetcher>,
        processor: DocumentProcessor,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            std::fs::create_dir_all(temp.path().join("src")).unwrap();
            let build = BuildContext::new(
                ProjectConfig::default(),
                temp.path().join("src"),
                temp.path().join("out"),
            );
            let fetcher = Arc::new(CountingFetcher::new().with_body(RAW_URL, "VALUE = 2\n"));
            let cache = ContentCache::new(build.cache_dir(), fetcher.clone());
            let processor = DocumentProcessor::standard(cache, ReferenceResolver::default());
            Self {
                temp,
                build,
                fetcher,
                processor,
            }
        }

        async fn process(&self, source: &str) -> Result<String> {
            let path = self.temp.path().join("src/index.md");
            let doc = self.build.document("index", &path);
            self.processor.process(source, &doc).await
        }
    }

    #[tokio::test]
    async fn test_remote_include_and_role() {
        let fixture = Fixture::new();
        let source = "\
# Guide

.. urlinclude::
   :github: org/repo
   :branch: v2

.. literalinclude:: lib/mod.py
   :github: org/repo

See :giturl:`the module <lib/mod.py>`.
";
        let out = fixture.process(source).await.unwrap();
        assert_eq!(
            out,
            "\
# Guide


```python
VALUE = 2
```

See [the module](https://github.com/org/repo/blob/v2/lib/mod.py).
"
        );
        assert_eq!(fixture.fetcher.calls(RAW_URL), 1);
        assert!(fixture.build.cache_dir().join(format!("{}.py", url_digest(RAW_URL))).exists());
    }

    #[tokio::test]
    async fn test_local_include_with_override_stays_local() {
        let fixture = Fixture::new();
        std::fs::write(fixture.temp.path().join("src/local.py"), "LOCAL = 1\n").unwrap();
        let source = ".. urlinclude::\n   :github: org/repo\n\n.. literalinclude:: local.py\n";

        let out = fixture.process(source).await.unwrap();
        assert!(out.contains("LOCAL = 1"));
        assert_eq!(fixture.fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_unknown_directive_is_error() {
        let fixture = Fixture::new();
        let err = fixture.process("text\n.. toctree::\n").await.unwrap_err();
        match err.downcast_ref::<UrlIncludeError>() {
            Some(UrlIncludeError::UnknownDirective {
                name,
                line,
                ..
            }) => {
                assert_eq!(name, "toctree");
                assert_eq!(*line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_option_is_error() {
        let fixture = Fixture::new();
        let err = fixture.process(".. urlinclude::\n   :url: https://example.com/a.py\n").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UrlIncludeError>(),
            Some(UrlIncludeError::UnknownOption { option, line: 2, .. }) if option == "url"
        ));
    }

    #[tokio::test]
    async fn test_missing_argument_is_error() {
        let fixture = Fixture::new();
        let err = fixture.process(".. literalinclude::\n").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UrlIncludeError>(),
            Some(UrlIncludeError::DirectiveSyntax { .. })
        ));
    }

    #[tokio::test]
    async fn test_role_without_repository_is_error_with_line() {
        let fixture = Fixture::new();
        let err = fixture.process("one\ntwo :giturl:`a.py`\n").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UrlIncludeError>(),
            Some(UrlIncludeError::ReferenceConfig { line: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_roles_and_fences_are_untouched() {
        let fixture = Fixture::new();
        let source = "Use :kbd:`Ctrl+C`.\n\n```\n:giturl:`a.py`\n```\n";
        assert_eq!(fixture.process(source).await.unwrap(), source);
    }

    #[test]
    fn test_split_arguments() {
        assert_eq!(split_arguments("  a.py  ", 1), vec!["a.py"]);
        assert_eq!(split_arguments("a b  c", 2), vec!["a", "b  c"]);
        assert_eq!(split_arguments("my file.py", 1), vec!["my file.py"]);
        assert!(split_arguments("", 1).is_empty());
        assert!(split_arguments("x", 0).is_empty());
    }
}
