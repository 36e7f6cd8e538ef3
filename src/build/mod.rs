//! Building a documentation tree.
//!
//! A build walks the source directory for `*.md` documents, runs every
//! directive and role through a [`DocumentProcessor`] and writes the rendered
//! markdown to the output directory under the same relative path:
//!
//! ```text
//! docs/                         out/
//! ├── urlinclude.toml           ├── .doctrees/
//! ├── index.md           =>     ├── _urlinclude/      # download cache
//! └── guide/                    ├── index.md
//!     └── setup.md              └── guide/
//!                                   └── setup.md
//! ```
//!
//! Documents are processed in name order. With more than one job, up to that
//! many documents are in flight at once; the content cache guarantees a
//! single download per URL either way. The first failing document stops the
//! build.

pub mod context;

pub use context::{BuildContext, DocContext};

use crate::cache::{CacheStats, ContentCache};
use crate::config::ProjectConfig;
use crate::constants::DEFAULT_BUILD_JOBS;
use crate::directive::DocumentProcessor;
use crate::fetch::UrlFetcher;
use crate::reference::ReferenceResolver;
use crate::utils::fs::{absolute_path, atomic_write, ensure_dir, to_slash};
use crate::utils::progress::ProgressBar;
use anyhow::{Context, Result};
use futures::{StreamExt, TryStreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use walkdir::WalkDir;

/// A source document found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Source-relative path without extension, `/`-separated
    pub docname: String,
    pub path: PathBuf,
}

/// Outcome of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub documents: usize,
    pub cache: CacheStats,
    pub out_dir: PathBuf,
}

/// Drives one build from source directory to output directory.
pub struct Builder {
    context: BuildContext,
    cache: ContentCache,
    processor: DocumentProcessor,
    jobs: usize,
    progress: bool,
}

impl Builder {
    /// Prepares a build of `source_dir` into `out_dir`.
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid or a directory cannot be made
    /// absolute.
    pub fn new(
        config: ProjectConfig,
        source_dir: &Path,
        out_dir: &Path,
        fetcher: Arc<dyn UrlFetcher>,
    ) -> Result<Self> {
        config.validate()?;
        let source_dir = absolute_path(source_dir)?;
        let out_dir = absolute_path(out_dir)?;

        let context = BuildContext::new(config, source_dir, out_dir);
        let cache = ContentCache::new(context.cache_dir(), fetcher)
            .with_force_refresh(context.config.force_refresh);
        let resolver = ReferenceResolver::from_config(&context.config);
        let processor = DocumentProcessor::standard(cache.clone(), resolver);

        Ok(Self {
            context,
            cache,
            processor,
            jobs: DEFAULT_BUILD_JOBS,
            progress: false,
        })
    }

    /// Number of documents processed concurrently. Zero is treated as one.
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    #[must_use]
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Lists the documents of the source tree in name order.
    ///
    /// Hidden directories and the output directory are skipped.
    ///
    /// # Errors
    ///
    /// Fails when the source directory cannot be read.
    pub fn discover(&self) -> Result<Vec<SourceDocument>> {
        let source_dir = &self.context.source_dir;
        let out_dir = &self.context.out_dir;
        let mut documents = Vec::new();

        let walker = WalkDir::new(source_dir).sort_by_file_name().into_iter().filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            !hidden && entry.path() != out_dir
        });

        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to read source directory {}", source_dir.display()))?;
            if !entry.file_type().is_file() || entry.path().extension().is_none_or(|ext| ext != "md") {
                continue;
            }
            let relative = entry.path().strip_prefix(source_dir).with_context(|| {
                format!("{} is outside {}", entry.path().display(), source_dir.display())
            })?;
            let docname = to_slash(&relative.with_extension(""));
            documents.push(SourceDocument {
                docname,
                path: entry.path().to_path_buf(),
            });
        }

        documents.sort_by(|a, b| a.docname.cmp(&b.docname));
        Ok(documents)
    }

    /// Builds every document.
    ///
    /// # Errors
    ///
    /// Returns the first document failure, with the document name as context.
    pub async fn build(&self) -> Result<BuildSummary> {
        ensure_dir(&self.context.out_dir)?;
        ensure_dir(&self.context.doctree_dir)?;

        let documents = self.discover()?;
        info!(
            "Building {} document(s) from {}",
            documents.len(),
            self.context.source_dir.display()
        );

        let progress = ProgressBar::new(documents.len() as u64, self.progress);
        futures::stream::iter(documents.iter())
            .map(|document| {
                let progress = &progress;
                async move {
                    progress.set_message(document.docname.clone());
                    self.build_document(document)
                        .await
                        .with_context(|| format!("Failed to build document '{}'", document.docname))?;
                    progress.inc(1);
                    Ok::<_, anyhow::Error>(())
                }
            })
            .buffered(self.jobs)
            .try_collect::<Vec<()>>()
            .await?;
        progress.finish_and_clear();

        let summary = BuildSummary {
            documents: documents.len(),
            cache: self.cache.stats(),
            out_dir: self.context.out_dir.clone(),
        };
        info!(
            "Built {} document(s): {} cache hit(s), {} download(s)",
            summary.documents, summary.cache.hits, summary.cache.fetches
        );
        Ok(summary)
    }

    async fn build_document(&self, document: &SourceDocument) -> Result<()> {
        debug!("Processing {}", document.docname);
        let source = tokio::fs::read_to_string(&document.path)
            .await
            .with_context(|| format!("Failed to read {}", document.path.display()))?;

        let ctx = self.context.document(&document.docname, &document.path);
        let rendered = self.processor.process(&source, &ctx).await?;

        let target = self.context.out_dir.join(format!("{}.md", document.docname));
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        tokio::task::spawn_blocking(move || atomic_write(&target, rendered.as_bytes()))
            .await
            .context("Failed to spawn blocking task for document write")??;
        Ok(())
    }
}
