//! Remote-capable wrapper around a literal includer.
//!
//! [`UrlLiteralInclude`] adds the `url`, `github` and `branch` options to any
//! literal-include directive. An invocation that names neither `url` nor
//! `github` itself is handed to the wrapped directive untouched. Otherwise the
//! reference is resolved against the document's override, the file is pulled
//! into the content cache, and the wrapped directive is run on the cached copy:
//!
//! ```text
//! .. literalinclude:: lib/mod.py          .. literalinclude:: ../../out/_urlinclude/3f2a9c0d5e71b84a.py
//!    :github: org/repo              =>
//!    :branch: v2
//! ```

use super::{Directive, DirectiveInvocation, DirectiveSpec, Node};
use crate::build::DocContext;
use crate::cache::ContentCache;
use crate::core::UrlIncludeError;
use crate::reference::{Override, REFERENCE_OPTIONS, ReferenceResolver};
use crate::utils::fs::to_slash;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Literal include that can read from a URL or a GitHub repository.
#[derive(Debug)]
pub struct UrlLiteralInclude<R> {
    inner: R,
    cache: ContentCache,
    resolver: ReferenceResolver,
}

impl<R: Directive> UrlLiteralInclude<R> {
    pub fn new(inner: R, cache: ContentCache, resolver: ReferenceResolver) -> Self {
        Self {
            inner,
            cache,
            resolver,
        }
    }
}

#[async_trait]
impl<R: Directive> Directive for UrlLiteralInclude<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn spec(&self) -> DirectiveSpec {
        self.inner.spec().with_options(&REFERENCE_OPTIONS)
    }

    async fn run(&self, mut invocation: DirectiveInvocation, ctx: &DocContext<'_>) -> Result<Vec<Node>> {
        let explicit = Override::from_options(&invocation.options);
        if !explicit.is_remote() {
            return self.inner.run(invocation, ctx).await;
        }

        let path = invocation.arguments.first().map(String::as_str).unwrap_or_default();
        let defaults = ctx.document_override();
        let url = self.resolver.include_url(defaults.as_ref(), &explicit, path).map_err(|reason| {
            UrlIncludeError::ReferenceConfig {
                docname: ctx.docname.to_string(),
                line: invocation.line,
                reason,
            }
        })?;

        let local = self.cache.ensure_local(&url, ctx.doc_dir()).await?;
        debug!("'{}' line {}: {} -> {}", ctx.docname, invocation.line, url, local.display());

        let local = to_slash(&local);
        match invocation.arguments.first_mut() {
            Some(argument) => *argument = local,
            None => invocation.arguments.push(local),
        }
        invocation.options.retain(|key, _| !REFERENCE_OPTIONS.contains(&key.as_str()));

        self.inner.run(invocation, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildContext;
    use crate::cache::url_digest;
    use crate::config::ProjectConfig;
    use crate::directive::{CodeBlockInclude, Options};
    use crate::reference::ReferenceError;
    use crate::test_utils::CountingFetcher;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const RAW_URL: &str = "https://github.com/org/repo/raw/v2/lib/mod.py";

    /// Records what the wrapped directive receives.
    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<DirectiveInvocation>>,
    }

    #[async_trait]
    impl Directive for Arc<Recorder> {
        fn name(&self) -> &str {
            "literalinclude"
        }

        fn spec(&self) -> DirectiveSpec {
            DirectiveSpec::new(1, 0).with_options(&["language"])
        }

        async fn run(&self, invocation: DirectiveInvocation, _ctx: &DocContext<'_>) -> Result<Vec<Node>> {
            self.seen.lock().unwrap().push(invocation);
            Ok(Vec::new())
        }
    }

    struct Fixture {
        temp: TempDir,
        build: BuildContext,
        fetcher: Arc<CountingFetcher>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let build = BuildContext::new(
                ProjectConfig::default(),
                temp.path().join("src"),
                temp.path().join("out"),
            );
            let fetcher = Arc::new(CountingFetcher::new().with_body(RAW_URL, "def f():\n    return 2\n"));
            Self {
                temp,
                build,
                fetcher,
            }
        }

        fn cache(&self) -> ContentCache {
            ContentCache::new(self.build.cache_dir(), self.fetcher.clone())
        }

        fn doc_path(&self) -> PathBuf {
            self.temp.path().join("src/guide/setup.md")
        }
    }

    fn invocation(options: &[(&str, &str)]) -> DirectiveInvocation {
        DirectiveInvocation {
            name: "literalinclude".to_string(),
            arguments: vec!["lib/mod.py".to_string()],
            options: options.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<Options>(),
            line: 7,
        }
    }

    #[test]
    fn test_spec_extends_inner_options() {
        let fixture = Fixture::new();
        let directive =
            UrlLiteralInclude::new(CodeBlockInclude, fixture.cache(), ReferenceResolver::default());
        let spec = directive.spec();
        assert_eq!(directive.name(), "literalinclude");
        assert!(spec.accepts("caption"));
        assert!(spec.accepts("url"));
        assert!(spec.accepts("github"));
        assert!(spec.accepts("branch"));
    }

    #[tokio::test]
    async fn test_plain_include_passes_through() {
        let fixture = Fixture::new();
        let recorder = Arc::new(Recorder::default());
        let directive =
            UrlLiteralInclude::new(recorder.clone(), fixture.cache(), ReferenceResolver::default());
        let doc_path = fixture.doc_path();
        let doc = fixture.build.document("guide/setup", &doc_path);
        doc.set_override(Override::github("org/repo"));

        let original = invocation(&[("language", "python"), ("branch", "v2")]);
        directive.run(original.clone(), &doc).await.unwrap();

        assert_eq!(recorder.seen.lock().unwrap()[0], original);
        assert_eq!(fixture.fetcher.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_github_include_is_rewritten_to_cache() {
        let fixture = Fixture::new();
        let recorder = Arc::new(Recorder::default());
        let directive =
            UrlLiteralInclude::new(recorder.clone(), fixture.cache(), ReferenceResolver::default());
        let doc_path = fixture.doc_path();
        let doc = fixture.build.document("guide/setup", &doc_path);

        directive
            .run(invocation(&[("github", "org/repo"), ("branch", "v2"), ("language", "python")]), &doc)
            .await
            .unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(
            seen[0].arguments,
            vec![format!("../../out/_urlinclude/{}.py", url_digest(RAW_URL))]
        );
        assert_eq!(seen[0].options.keys().collect::<Vec<_>>(), vec!["language"]);
        assert_eq!(fixture.fetcher.calls(RAW_URL), 1);
    }

    #[tokio::test]
    async fn test_document_override_supplies_defaults() {
        let fixture = Fixture::new();
        let directive =
            UrlLiteralInclude::new(CodeBlockInclude, fixture.cache(), ReferenceResolver::default());
        std::fs::create_dir_all(fixture.temp.path().join("src/guide")).unwrap();
        let doc_path = fixture.doc_path();
        let doc = fixture.build.document("guide/setup", &doc_path);
        doc.set_override(Override::github("org/other").with_branch("v2"));

        let nodes = directive.run(invocation(&[("github", "org/repo")]), &doc).await.unwrap();

        match &nodes[0] {
            Node::Literal {
                content,
                language,
                ..
            } => {
                assert_eq!(content, "def f():\n    return 2\n");
                assert_eq!(language.as_deref(), Some("python"));
            }
            other => panic!("unexpected node: {other:?}"),
        }
        assert_eq!(fixture.fetcher.calls(RAW_URL), 1);
    }

    #[tokio::test]
    async fn test_empty_github_is_reference_error() {
        let fixture = Fixture::new();
        let directive =
            UrlLiteralInclude::new(CodeBlockInclude, fixture.cache(), ReferenceResolver::default());
        let doc_path = fixture.doc_path();
        let doc = fixture.build.document("guide/setup", &doc_path);

        let err = directive.run(invocation(&[("github", "")]), &doc).await.unwrap_err();
        match err.downcast_ref::<UrlIncludeError>() {
            Some(UrlIncludeError::ReferenceConfig {
                docname,
                line,
                reason,
            }) => {
                assert_eq!(docname, "guide/setup");
                assert_eq!(*line, 7);
                assert_eq!(
                    *reason,
                    ReferenceError::EmptyField {
                        field: "github"
                    }
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_url_option_is_used_verbatim() {
        let fixture = Fixture::new();
        let recorder = Arc::new(Recorder::default());
        let directive =
            UrlLiteralInclude::new(recorder.clone(), fixture.cache(), ReferenceResolver::default());
        let doc_path = fixture.doc_path();
        let doc = fixture.build.document("guide/setup", &doc_path);

        directive.run(invocation(&[("url", RAW_URL)]), &doc).await.unwrap();

        assert_eq!(fixture.fetcher.calls(RAW_URL), 1);
        assert!(recorder.seen.lock().unwrap()[0].options.is_empty());
    }
}
