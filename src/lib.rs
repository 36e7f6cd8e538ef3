//! urlinclude - remote literal includes for documentation builds.
//!
//! Documentation often quotes source files that live in another repository.
//! urlinclude lets a `literalinclude` directive point at a complete URL or at a
//! file in a GitHub repository, downloads the file once into a
//! content-addressed cache beside the build output, and renders it like a
//! local include.
//!
//! # Architecture Overview
//!
//! ```text
//! source .md ──► markdown::parse_document ──► directive::DocumentProcessor
//!                                                  │
//!                    urlinclude ───────────────────┤ records document Override
//!                    literalinclude :github: ──────┤──► reference::ReferenceResolver ──► final URL
//!                    :giturl:`path` ───────────────┘                                        │
//!                                                                                           ▼
//!                                   cache::ContentCache ◄── fetch::UrlFetcher (http/file)
//!                                          │
//!                               <out>/_urlinclude/<digest>.py ──► rendered code block
//! ```
//!
//! # Core Modules
//!
//! - [`reference`] - Override merging and raw/blob URL construction
//! - [`cache`] - Digest-named cache entries, single-fetch guarantee, file locks
//! - [`directive`] - Directive and role traits, built-in handlers, the processor
//! - [`build`] - Build context with the per-document override store, the build driver
//!
//! ## Supporting Modules
//!
//! - [`markdown`] - Directive block parsing and markdown rendering
//! - [`fetch`] - HTTP and `file://` fetching
//! - [`config`] - `urlinclude.toml`
//! - [`core`] - Error types and user-facing error rendering
//! - [`cli`] - The `urlinclude` binary's commands
//! - [`utils`] - Atomic writes, path helpers, progress bars
//!
//! # Example Document
//!
//! ```text
//! .. urlinclude::
//!    :github: org/repo
//!    :branch: main
//!
//! .. literalinclude:: lib/mod.py
//!    :github: org/repo
//!    :branch: v2
//!
//! The full module is at :giturl:`lib/mod.py`.
//! ```
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use urlinclude::build::Builder;
//! use urlinclude::config::ProjectConfig;
//! use urlinclude::fetch::HttpFetcher;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ProjectConfig::load_from_dir(Path::new("docs")).await?;
//! let fetcher = Arc::new(HttpFetcher::new(&config.network)?);
//! let summary = Builder::new(config, Path::new("docs"), Path::new("_build"), fetcher)?
//!     .with_jobs(4)
//!     .build()
//!     .await?;
//! println!("{} documents, {} downloads", summary.documents, summary.cache.fetches);
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod directive;
pub mod fetch;
pub mod markdown;
pub mod reference;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
