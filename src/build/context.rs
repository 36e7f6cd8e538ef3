//! Build-scoped state shared by directives and roles.

use crate::cache::cache_dir_for;
use crate::config::ProjectConfig;
use crate::constants::DOCTREE_DIR_NAME;
use crate::reference::Override;
use dashmap::DashMap;
use std::path::{Path, PathBuf};

/// State owned by one build run.
///
/// Holds the per-document override store: the `urlinclude` directive records
/// an [`Override`] under its document name, and later includes and roles of
/// the same document read it back. Entries are only written while their own
/// document is processed, so concurrent documents never contend on a key.
///
/// # Fields
///
/// * `config` - Project configuration in effect
/// * `source_dir` - Root of the documentation sources
/// * `out_dir` - Root of the rendered output
/// * `doctree_dir` - Intermediate directory; the download cache sits beside it
#[derive(Debug)]
pub struct BuildContext {
    pub config: ProjectConfig,
    pub source_dir: PathBuf,
    pub out_dir: PathBuf,
    pub doctree_dir: PathBuf,
    overrides: DashMap<String, Override>,
}

impl BuildContext {
    /// Creates a context for building `source_dir` into `out_dir`.
    pub fn new(config: ProjectConfig, source_dir: PathBuf, out_dir: PathBuf) -> Self {
        let doctree_dir = out_dir.join(DOCTREE_DIR_NAME);
        Self {
            config,
            source_dir,
            out_dir,
            doctree_dir,
            overrides: DashMap::new(),
        }
    }

    /// Directory of the download cache for this build.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        cache_dir_for(&self.doctree_dir, &self.config.cache_dir_name)
    }

    /// The override recorded for `docname`, if any.
    #[must_use]
    pub fn document_override(&self, docname: &str) -> Option<Override> {
        self.overrides.get(docname).map(|entry| entry.value().clone())
    }

    /// Records `value` for `docname`, replacing any previous override wholesale.
    pub fn set_override(&self, docname: &str, value: Override) {
        self.overrides.insert(docname.to_string(), value);
    }

    /// Context for processing one document.
    pub fn document<'a>(&'a self, docname: &'a str, source_path: &'a Path) -> DocContext<'a> {
        DocContext {
            build: self,
            docname,
            source_path,
        }
    }
}

/// The document currently being processed.
#[derive(Debug, Clone, Copy)]
pub struct DocContext<'a> {
    pub build: &'a BuildContext,
    /// Source-relative name without extension, `/`-separated
    pub docname: &'a str,
    pub source_path: &'a Path,
}

impl DocContext<'_> {
    /// Directory containing the document. Include paths are relative to it.
    #[must_use]
    pub fn doc_dir(&self) -> &Path {
        self.source_path.parent().unwrap_or(&self.build.source_dir)
    }

    #[must_use]
    pub fn document_override(&self) -> Option<Override> {
        self.build.document_override(self.docname)
    }

    pub fn set_override(&self, value: Override) {
        self.build.set_override(self.docname, value);
    }
}
