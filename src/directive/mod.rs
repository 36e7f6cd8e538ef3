//! Directive and role extension points.
//!
//! A [`Directive`] turns one parsed directive block into document [`Node`]s; a
//! [`Role`] does the same for an inline `` :name:`text` `` invocation. The
//! [`DocumentProcessor`] dispatches blocks and roles by name, checks arguments
//! and options against each directive's [`DirectiveSpec`] and renders the
//! resulting nodes.
//!
//! # Built-in Handlers
//!
//! | Name | Type | Purpose |
//! |------|------|---------|
//! | `urlinclude` | [`UrlIncludeConfig`] | Records the document's reference override |
//! | `literalinclude` | [`UrlLiteralInclude`] over [`CodeBlockInclude`] | Includes a local or remote file as a code block |
//! | `giturl` | [`GitUrlRole`] | Links to a file in the document's GitHub repository |
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use std::sync::Arc;
//! use urlinclude::build::BuildContext;
//! use urlinclude::cache::ContentCache;
//! use urlinclude::config::ProjectConfig;
//! use urlinclude::directive::DocumentProcessor;
//! use urlinclude::fetch::HttpFetcher;
//! use urlinclude::reference::ReferenceResolver;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ProjectConfig::default();
//! let build = BuildContext::new(config.clone(), PathBuf::from("docs"), PathBuf::from("out"));
//! let cache = ContentCache::new(build.cache_dir(), Arc::new(HttpFetcher::new(&config.network)?));
//! let processor = DocumentProcessor::standard(cache, ReferenceResolver::from_config(&config));
//!
//! let source_path = PathBuf::from("docs/index.md");
//! let doc = build.document("index", &source_path);
//! let rendered = processor.process(".. urlinclude::\n   :github: org/repo\n", &doc).await?;
//! # Ok(())
//! # }
//! ```

pub mod literal;
pub mod processor;
pub mod role;
pub mod url_literal;
pub mod urlinclude;

pub use literal::CodeBlockInclude;
pub use processor::DocumentProcessor;
pub use role::{GitUrlRole, split_explicit_title, unescape};
pub use url_literal::UrlLiteralInclude;
pub use urlinclude::UrlIncludeConfig;

use crate::build::DocContext;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Directive options keyed by option name.
pub type Options = BTreeMap<String, String>;

/// A document node produced by a directive or role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal markdown
    Text(String),
    /// A code block holding a file's content
    Literal {
        language: Option<String>,
        content: String,
        caption: Option<String>,
        /// Path the content was read from, as given to the includer
        source: PathBuf,
    },
    /// A hyperlink
    Reference { title: String, uri: String },
}

/// Arguments and options a directive accepts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSpec {
    pub required_arguments: usize,
    pub optional_arguments: usize,
    /// Accepted option keys
    pub options: Vec<&'static str>,
}

impl DirectiveSpec {
    #[must_use]
    pub fn new(required_arguments: usize, optional_arguments: usize) -> Self {
        Self {
            required_arguments,
            optional_arguments,
            options: Vec::new(),
        }
    }

    /// Adds accepted option keys, skipping ones already present.
    #[must_use]
    pub fn with_options(mut self, keys: &[&'static str]) -> Self {
        for key in keys {
            if !self.options.contains(key) {
                self.options.push(key);
            }
        }
        self
    }

    #[must_use]
    pub fn accepts(&self, key: &str) -> bool {
        self.options.contains(&key)
    }

    /// Largest number of positional arguments.
    #[must_use]
    pub fn max_arguments(&self) -> usize {
        self.required_arguments + self.optional_arguments
    }
}

/// A directive block after argument splitting and option validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveInvocation {
    pub name: String,
    pub arguments: Vec<String>,
    pub options: Options,
    /// One-based line of the directive header
    pub line: usize,
}

/// A block-level directive handler.
#[async_trait]
pub trait Directive: Send + Sync {
    /// Name used after `..` in sources.
    fn name(&self) -> &str;

    fn spec(&self) -> DirectiveSpec;

    /// Produces the nodes replacing the directive block.
    ///
    /// # Errors
    ///
    /// Any error aborts processing of the current document.
    async fn run(&self, invocation: DirectiveInvocation, ctx: &DocContext<'_>) -> Result<Vec<Node>>;
}

/// An inline role handler.
pub trait Role: Send + Sync {
    /// Name used between colons in sources.
    fn name(&self) -> &str;

    /// Produces the nodes replacing the role invocation.
    ///
    /// # Errors
    ///
    /// Any error aborts processing of the current document.
    fn run(&self, text: &str, line: usize, ctx: &DocContext<'_>) -> Result<Vec<Node>>;
}
