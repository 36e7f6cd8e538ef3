use anyhow::Result;
use std::sync::Arc;
use urlinclude::build::Builder;
use urlinclude::cache::{CacheStats, url_digest};
use urlinclude::config::ProjectConfig;
use urlinclude::core::{UrlIncludeError, user_friendly_error};
use urlinclude::reference::ReferenceError;
use urlinclude::test_utils::{CountingFetcher, SourceTree, init_test_logging};

const MOD_V2: &str = "https://github.com/org/repo/raw/v2/lib/mod.py";
const MOD_MAIN: &str = "https://github.com/org/repo/raw/main/lib/mod.py";
const SETUP_URL: &str = "https://example.com/scripts/setup.py";

fn fetcher() -> Arc<CountingFetcher> {
    Arc::new(
        CountingFetcher::new()
            .with_body(MOD_V2, "def answer():\n    return 2\n")
            .with_body(MOD_MAIN, "def answer():\n    return 1\n")
            .with_body(SETUP_URL, "setup()\n"),
    )
}

fn builder(tree: &SourceTree, fetcher: &Arc<CountingFetcher>) -> Result<Builder> {
    Builder::new(ProjectConfig::default(), &tree.source_dir(), &tree.out_dir(), fetcher.clone())
}

/// A document mixing every directive and the role renders completely.
#[tokio::test]
async fn test_full_document() -> Result<()> {
    init_test_logging(None);
    let tree = SourceTree::new()?;
    tree.write(
        "guide/usage.md",
        "\
# Usage

.. urlinclude::
   :github: org/repo
   :branch: main

.. literalinclude:: lib/mod.py
   :github: org/repo
   :branch: v2
   :caption: Version 2

Read :giturl:`the source <lib/mod.py>` or :giturl:`lib/mod.py`.
",
    )?;

    let fetcher = fetcher();
    let summary = builder(&tree, &fetcher)?.build().await?;
    assert_eq!(summary.documents, 1);

    let out = tree.read_output("guide/usage.md")?;
    assert_eq!(
        out,
        "\
# Usage


*Version 2*

```python
def answer():
    return 2
```

Read [the source](https://github.com/org/repo/blob/main/lib/mod.py) or \
[lib/mod.py](https://github.com/org/repo/blob/main/lib/mod.py).
"
    );
    Ok(())
}

/// A `url` include is fetched verbatim; its argument is only a placeholder.
#[tokio::test]
async fn test_url_include() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write(
        "scripts.md",
        ".. literalinclude:: setup.py\n   :url: https://example.com/scripts/setup.py\n   :language: text\n",
    )?;

    let fetcher = fetcher();
    builder(&tree, &fetcher)?.build().await?;

    assert_eq!(tree.read_output("scripts.md")?, "```text\nsetup()\n```\n");
    assert_eq!(fetcher.calls(SETUP_URL), 1);
    Ok(())
}

/// A document-level `github` takes precedence over an include's own `url`.
#[tokio::test]
async fn test_github_default_beats_explicit_url() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write(
        "index.md",
        ".. urlinclude::\n   :github: org/repo\n   :branch: v2\n\n.. literalinclude:: lib/mod.py\n   :url: https://example.com/scripts/setup.py\n",
    )?;

    let fetcher = fetcher();
    builder(&tree, &fetcher)?.build().await?;

    assert_eq!(fetcher.calls(MOD_V2), 1);
    assert_eq!(fetcher.calls(SETUP_URL), 0);
    Ok(())
}

/// The cache sits beside the doctree directory and entries are digest-named.
#[tokio::test]
async fn test_cache_layout() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write("index.md", ".. literalinclude:: lib/mod.py\n   :github: org/repo\n   :branch: v2\n")?;

    let fetcher = fetcher();
    builder(&tree, &fetcher)?.build().await?;

    let cache_dir = tree.out_dir().join("_urlinclude");
    let entry = cache_dir.join(format!("{}.py", url_digest(MOD_V2)));
    assert!(tree.out_dir().join(".doctrees").is_dir());
    assert_eq!(std::fs::read_to_string(&entry)?, "def answer():\n    return 2\n");
    assert_eq!(
        std::fs::read_to_string(cache_dir.join(format!("{}.url", url_digest(MOD_V2))))?,
        format!("{MOD_V2}\n")
    );
    Ok(())
}

/// Repeated builds and repeated references fetch each URL once.
#[tokio::test]
async fn test_each_url_fetched_once() -> Result<()> {
    let tree = SourceTree::new()?;
    let include = ".. literalinclude:: lib/mod.py\n   :github: org/repo\n   :branch: v2\n\n";
    tree.write("a.md", &include.repeat(3))?;
    tree.write("b.md", include)?;

    let fetcher = fetcher();
    let first = builder(&tree, &fetcher)?.build().await?;
    assert_eq!(first.cache, CacheStats { hits: 3, fetches: 1 });

    let second = builder(&tree, &fetcher)?.with_jobs(2).build().await?;
    assert_eq!(second.cache, CacheStats { hits: 4, fetches: 0 });
    assert_eq!(fetcher.calls(MOD_V2), 1);
    Ok(())
}

/// Overrides are scoped to their document.
#[tokio::test]
async fn test_overrides_do_not_leak_between_documents() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write("a.md", ".. urlinclude::\n   :github: org/repo\n\n:giturl:`x.py`\n")?;
    tree.write("b.md", ":giturl:`x.py`\n")?;

    let err = builder(&tree, &fetcher())?.build().await.unwrap_err();
    assert!(err.to_string().contains("Failed to build document 'b'"));
    match err.downcast_ref::<UrlIncludeError>() {
        Some(UrlIncludeError::ReferenceConfig {
            docname,
            line,
            reason,
        }) => {
            assert_eq!(docname, "b");
            assert_eq!(*line, 1);
            assert_eq!(*reason, ReferenceError::MissingGithub);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(tree.read_output("a.md")?, "\n[x.py](https://github.com/org/repo/blob/master/x.py)\n");
    Ok(())
}

/// A later `urlinclude` replaces the earlier override for what follows it.
#[tokio::test]
async fn test_override_replaced_midway() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write(
        "index.md",
        "\
.. urlinclude::
   :github: org/repo
   :branch: v2

:giturl:`a.py`

.. urlinclude::
   :github: org/other

:giturl:`a.py`
",
    )?;

    builder(&tree, &fetcher())?.build().await?;
    let out = tree.read_output("index.md")?;
    assert!(out.contains("(https://github.com/org/repo/blob/v2/a.py)"));
    assert!(out.contains("(https://github.com/org/other/blob/master/a.py)"));
    Ok(())
}

/// A configured host and default branch shape every URL.
#[tokio::test]
async fn test_configured_host_and_branch() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write("index.md", ".. urlinclude::\n   :github: org/repo\n\n:giturl:`a.py`\n")?;

    let config = ProjectConfig {
        github_host: "https://git.example.com/".to_string(),
        default_branch: "main".to_string(),
        ..ProjectConfig::default()
    };
    Builder::new(config, &tree.source_dir(), &tree.out_dir(), fetcher())?.build().await?;

    assert!(tree.read_output("index.md")?.contains("(https://git.example.com/org/repo/blob/main/a.py)"));
    Ok(())
}

/// Network failures surface with the URL and leave no cache entry behind.
#[tokio::test]
async fn test_missing_remote_file() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write("index.md", ".. literalinclude:: nope.py\n   :github: org/repo\n")?;

    let fetcher = fetcher();
    let err = builder(&tree, &fetcher)?.build().await.unwrap_err();

    let missing = "https://github.com/org/repo/raw/master/nope.py";
    let ctx = user_friendly_error(err);
    assert!(matches!(&ctx.error, UrlIncludeError::HttpStatus { url, status: 404 } if url == missing));
    assert_eq!(ctx.details.as_deref(), Some("Failed to build document 'index'"));
    assert!(!tree.out_dir().join("_urlinclude").join(format!("{}.py", url_digest(missing))).exists());
    Ok(())
}

/// Plain local includes work next to remote ones and never fetch.
#[tokio::test]
async fn test_local_include_untouched() -> Result<()> {
    let tree = SourceTree::new()?;
    tree.write("snippets/hello.rs", "fn main() {}\n")?;
    tree.write(
        "index.md",
        ".. urlinclude::\n   :github: org/repo\n\n.. literalinclude:: snippets/hello.rs\n",
    )?;

    let fetcher = fetcher();
    builder(&tree, &fetcher)?.build().await?;

    assert_eq!(tree.read_output("index.md")?, "\n```rust\nfn main() {}\n```\n");
    assert_eq!(fetcher.total_calls(), 0);
    Ok(())
}
