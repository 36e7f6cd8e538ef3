//! Test utilities for urlinclude.
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suite.
//!
//! - [`init_test_logging`] installs a tracing subscriber once per process
//! - [`CountingFetcher`] serves canned bodies and counts requests per URL
//! - [`SourceTree`] writes a documentation source directory into a temp dir

use crate::core::UrlIncludeError;
use crate::fetch::UrlFetcher;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, Once};
use std::time::Duration;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`. Without either, tests run
/// silently.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// In-memory [`UrlFetcher`] with per-URL call counting.
///
/// Unknown URLs answer with HTTP 404.
#[derive(Debug, Default)]
pub struct CountingFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl CountingFetcher {
    /// A fetcher that knows no URLs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    #[must_use]
    pub fn with_body(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_bytes(url, body.into().into_bytes())
    }

    /// Serves raw `bytes` for `url`.
    #[must_use]
    pub fn with_bytes(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.bodies.insert(url.into(), bytes);
        self
    }

    /// Sleeps before answering, to widen race windows.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests made for `url`.
    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().map(|calls| calls.get(url).copied().unwrap_or(0)).unwrap_or(0)
    }

    /// Number of requests made for any URL.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|calls| calls.values().sum()).unwrap_or(0)
    }
}

#[async_trait]
impl UrlFetcher for CountingFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(url.to_string()).or_insert(0) += 1;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.bodies.get(url).cloned().ok_or_else(|| {
            UrlIncludeError::HttpStatus {
                url: url.to_string(),
                status: 404,
            }
            .into()
        })
    }
}

/// A temporary documentation project: `src/` for sources, `out/` for output.
pub struct SourceTree {
    _temp: TempDir,
    root: PathBuf,
}

impl SourceTree {
    /// Creates an empty project with an existing `src/` directory.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().to_path_buf();
        std::fs::create_dir_all(root.join("src"))?;
        Ok(Self {
            _temp: temp,
            root,
        })
    }

    /// Source directory.
    pub fn source_dir(&self) -> PathBuf {
        self.root.join("src")
    }

    /// Output directory.
    pub fn out_dir(&self) -> PathBuf {
        self.root.join("out")
    }

    /// Writes a file below `src/`, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.source_dir().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Reads a file below `out/`.
    pub fn read_output(&self, relative: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.out_dir().join(relative))?)
    }
}
