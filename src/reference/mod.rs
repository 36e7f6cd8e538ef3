//! Remote reference overrides and final URL resolution.
//!
//! A reference names a remote file either by a complete `url` or by a GitHub
//! `owner/repo` plus `branch` and a path inside the repository. Documents can
//! register an [`Override`] once (through the `urlinclude` directive) and every
//! include or link in the same document layers its own options on top of it.
//!
//! # Merge Rules
//!
//! Explicit invocation options win field by field over document defaults:
//!
//! ```rust
//! use urlinclude::reference::{Override, ReferenceResolver};
//!
//! let defaults = Override::github("a/b").with_branch("main");
//! let explicit = Override::default().with_branch("dev");
//!
//! let resolver = ReferenceResolver::default();
//! let url = resolver.include_url(Some(&defaults), &explicit, "src/lib.py").unwrap();
//! assert_eq!(url, "https://github.com/a/b/raw/dev/src/lib.py");
//! ```
//!
//! # URL Shapes
//!
//! Includes need the raw file content (`/raw/`), links point at the browsable
//! page (`/blob/`). A `url` reference is only meaningful for includes and is
//! used verbatim.

use crate::config::ProjectConfig;
use crate::constants::{DEFAULT_BRANCH, DEFAULT_GITHUB_HOST};
use std::collections::BTreeMap;
use thiserror::Error;

/// Option key naming a complete remote URL.
pub const URL_OPTION: &str = "url";
/// Option key naming a GitHub `owner/repo`.
pub const GITHUB_OPTION: &str = "github";
/// Option key naming a branch or tag.
pub const BRANCH_OPTION: &str = "branch";

/// All option keys that describe a remote reference.
pub const REFERENCE_OPTIONS: [&str; 3] = [URL_OPTION, GITHUB_OPTION, BRANCH_OPTION];

/// Errors raised while turning a reference into a final URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// Neither `url` nor `github` is available after merging.
    #[error("missing reference source: set either `url` or `github`")]
    MissingSource,

    /// Links can only be built from a GitHub repository.
    #[error("missing `github` option: repository links need an owner/repo")]
    MissingGithub,

    /// A reference field was given without a value.
    #[error("option `{field}` must not be empty")]
    EmptyField {
        /// The offending option key
        field: &'static str,
    },
}

/// Partial reference fields, either registered per document or given on a
/// single directive or role invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Override {
    /// GitHub repository as `owner/repo`
    pub github: Option<String>,
    /// Branch or tag name, only used together with `github`
    pub branch: Option<String>,
    /// Complete URL of the remote file
    pub url: Option<String>,
}

impl Override {
    /// Reference to a GitHub repository on its default branch.
    pub fn github(repo: impl Into<String>) -> Self {
        Self {
            github: Some(repo.into()),
            ..Self::default()
        }
    }

    /// Reference to a complete URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Returns a copy with `branch` set.
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Extracts the reference fields from raw directive options.
    ///
    /// Keys other than `url`, `github` and `branch` are ignored.
    #[must_use]
    pub fn from_options(options: &BTreeMap<String, String>) -> Self {
        Self {
            github: options.get(GITHUB_OPTION).cloned(),
            branch: options.get(BRANCH_OPTION).cloned(),
            url: options.get(URL_OPTION).cloned(),
        }
    }

    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.github.is_none() && self.branch.is_none() && self.url.is_none()
    }

    /// True when the fields select a remote source (`github` or `url`).
    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.github.is_some() || self.url.is_some()
    }

    /// Layers `explicit` on top of `self`; every field set in `explicit` wins.
    #[must_use]
    pub fn merge(&self, explicit: &Override) -> Override {
        Override {
            github: explicit.github.clone().or_else(|| self.github.clone()),
            branch: explicit.branch.clone().or_else(|| self.branch.clone()),
            url: explicit.url.clone().or_else(|| self.url.clone()),
        }
    }

    /// Merges optional document defaults with an invocation's explicit fields.
    #[must_use]
    pub fn layered(defaults: Option<&Override>, explicit: &Override) -> Override {
        match defaults {
            Some(defaults) => defaults.merge(explicit),
            None => explicit.clone(),
        }
    }
}

/// Which page of a repository file a GitHub URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    /// Raw file content, used for includes
    Raw,
    /// Browsable page, used for links
    Blob,
}

impl UrlShape {
    fn segment(self) -> &'static str {
        match self {
            UrlShape::Raw => "raw",
            UrlShape::Blob => "blob",
        }
    }
}

/// Turns merged references into final URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceResolver {
    github_host: String,
    default_branch: String,
}

impl Default for ReferenceResolver {
    fn default() -> Self {
        Self::new(DEFAULT_GITHUB_HOST, DEFAULT_BRANCH)
    }
}

impl ReferenceResolver {
    /// Creates a resolver for a GitHub-compatible host.
    pub fn new(github_host: impl Into<String>, default_branch: impl Into<String>) -> Self {
        let github_host = github_host.into().trim_end_matches('/').to_string();
        Self {
            github_host,
            default_branch: default_branch.into(),
        }
    }

    /// Creates a resolver from the project configuration.
    #[must_use]
    pub fn from_config(config: &ProjectConfig) -> Self {
        Self::new(&config.github_host, &config.default_branch)
    }

    /// Resolves the raw-content URL an include should fetch.
    ///
    /// `github` takes precedence over `url`. A `url` reference is complete on
    /// its own and `path` is not appended to it.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::MissingSource`] when neither field is set and
    /// [`ReferenceError::EmptyField`] when a set field is blank.
    pub fn include_url(
        &self,
        defaults: Option<&Override>,
        explicit: &Override,
        path: &str,
    ) -> Result<String, ReferenceError> {
        let merged = Override::layered(defaults, explicit);

        if let Some(github) = &merged.github {
            return self.github_url(github, merged.branch.as_deref(), UrlShape::Raw, path);
        }

        match &merged.url {
            Some(url) if url.trim().is_empty() => Err(ReferenceError::EmptyField {
                field: URL_OPTION,
            }),
            Some(url) => Ok(url.clone()),
            None => Err(ReferenceError::MissingSource),
        }
    }

    /// Resolves the browsable GitHub URL a link should point at.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::MissingGithub`] when no repository is known,
    /// even if a `url` is set.
    pub fn link_url(
        &self,
        defaults: Option<&Override>,
        explicit: &Override,
        path: &str,
    ) -> Result<String, ReferenceError> {
        let merged = Override::layered(defaults, explicit);
        let github = merged.github.as_deref().ok_or(ReferenceError::MissingGithub)?;
        self.github_url(github, merged.branch.as_deref(), UrlShape::Blob, path)
    }

    fn github_url(
        &self,
        github: &str,
        branch: Option<&str>,
        shape: UrlShape,
        path: &str,
    ) -> Result<String, ReferenceError> {
        let github = github.trim().trim_matches('/');
        if github.is_empty() {
            return Err(ReferenceError::EmptyField {
                field: GITHUB_OPTION,
            });
        }

        let branch = branch.unwrap_or(&self.default_branch).trim();
        if branch.is_empty() {
            return Err(ReferenceError::EmptyField {
                field: BRANCH_OPTION,
            });
        }

        Ok(format!(
            "{}/{}/{}/{}/{}",
            self.github_host,
            github,
            shape.segment(),
            branch,
            path.trim_start_matches('/')
        ))
    }
}
