//! Content-addressed download cache for remote includes.
//!
//! Every final URL maps to one file in the cache directory, named after a short
//! digest of the URL:
//!
//! ```text
//! <output>/_urlinclude/
//! ├── 3f2a9c0d5e71b84a.py      # fetched content, always with a .py suffix
//! ├── 3f2a9c0d5e71b84a.url     # the URL that owns the digest
//! └── .locks/
//!     └── 3f2a9c0d5e71b84a.lock
//! ```
//!
//! # Fetch Semantics
//!
//! - A missing entry is fetched, decoded as UTF-8 and written atomically.
//! - An existing entry is served as is: no freshness check, no conditional
//!   request. Entries live as long as the output directory.
//! - With `force_refresh` every URL is fetched again once per cache instance,
//!   then served from disk for the rest of the build.
//! - A failed fetch or decode leaves nothing behind, so the next build retries.
//!
//! # Concurrency
//!
//! Misses are serialised per digest by an in-process async mutex and an OS
//! file lock ([`CacheLock`]). Concurrent requests for the same URL, from this
//! process or another build sharing the directory, perform a single fetch;
//! different URLs proceed in parallel.
//!
//! # Collisions
//!
//! Digests are 64-bit SHA-256 prefixes. The `.url` sidecar records which URL
//! owns a digest, and a second URL landing on the same digest is reported as
//! [`UrlIncludeError::DigestCollision`] instead of silently sharing content.

pub mod lock;

pub use lock::CacheLock;

use crate::constants::{CACHE_FILE_SUFFIX, CACHE_OWNER_SUFFIX, DIGEST_BYTES};
use crate::core::UrlIncludeError;
use crate::fetch::UrlFetcher;
use crate::utils::fs::{atomic_write, relative_path};
use anyhow::{Context, Result};
use dashmap::{DashMap, DashSet};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Computes the cache digest of a final URL.
///
/// ```rust
/// use urlinclude::cache::url_digest;
///
/// let digest = url_digest("https://github.com/org/repo/raw/v2/lib/mod.py");
/// assert_eq!(digest.len(), 16);
/// assert_eq!(digest, url_digest("https://github.com/org/repo/raw/v2/lib/mod.py"));
/// ```
#[must_use]
pub fn url_digest(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..DIGEST_BYTES])
}

/// Cache directory of a build: a sibling of the doctree directory.
///
/// ```rust
/// use std::path::Path;
/// use urlinclude::cache::cache_dir_for;
///
/// let dir = cache_dir_for(Path::new("out/.doctrees"), "_urlinclude");
/// assert_eq!(dir, Path::new("out/_urlinclude"));
/// ```
#[must_use]
pub fn cache_dir_for(doctree_dir: &Path, cache_dir_name: &str) -> PathBuf {
    doctree_dir.parent().unwrap_or(doctree_dir).join(cache_dir_name)
}

/// Counters for one cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from an existing entry
    pub hits: usize,
    /// Lookups that downloaded content
    pub fetches: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicUsize,
    fetches: AtomicUsize,
}

/// The download cache of one build output tree.
#[derive(Clone)]
pub struct ContentCache {
    /// Directory holding entries, sidecars and locks
    dir: PathBuf,

    fetcher: Arc<dyn UrlFetcher>,

    force_refresh: bool,

    /// Per-digest async locks serialising misses inside this process.
    entry_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,

    /// Digests fetched by this instance; consulted when `force_refresh` is set.
    refreshed: Arc<DashSet<String>>,

    counters: Arc<Counters>,
}

impl std::fmt::Debug for ContentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentCache")
            .field("dir", &self.dir)
            .field("force_refresh", &self.force_refresh)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ContentCache {
    /// Creates a cache rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>, fetcher: Arc<dyn UrlFetcher>) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
            force_refresh: false,
            entry_locks: Arc::new(DashMap::new()),
            refreshed: Arc::new(DashSet::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Re-fetch each URL once during this cache's lifetime.
    #[must_use]
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.force_refresh = force_refresh;
        self
    }

    /// Directory holding the cache entries.
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `url`, whether or not it exists yet.
    #[must_use]
    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.{CACHE_FILE_SUFFIX}", url_digest(url)))
    }

    /// Snapshot of the hit and fetch counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            fetches: self.counters.fetches.load(Ordering::Relaxed),
        }
    }

    /// Creates the cache directory if needed. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`UrlIncludeError::FileSystemError`] when the directory cannot be
    /// created.
    pub async fn ensure_cache_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            UrlIncludeError::FileSystemError {
                operation: "creating cache directory".to_string(),
                path: self.dir.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(())
    }

    /// Ensures `url` is cached and returns the entry relative to `doc_dir`.
    ///
    /// The relative form is what a document located in `doc_dir` writes as its
    /// include argument.
    ///
    /// # Errors
    ///
    /// See [`ContentCache::ensure_cached`].
    pub async fn ensure_local(&self, url: &str, doc_dir: &Path) -> Result<PathBuf> {
        let entry = self.ensure_cached(url).await?;
        relative_path(&entry, doc_dir)
    }

    /// Ensures `url` is cached and returns the entry path.
    ///
    /// # Errors
    ///
    /// - [`UrlIncludeError::FetchFailed`] / [`UrlIncludeError::HttpStatus`] when the
    ///   download fails
    /// - [`UrlIncludeError::DecodeFailed`] when the body is not UTF-8
    /// - [`UrlIncludeError::FileSystemError`] when the cache cannot be written
    /// - [`UrlIncludeError::DigestCollision`] when another URL owns the digest
    pub async fn ensure_cached(&self, url: &str) -> Result<PathBuf> {
        self.ensure_cache_dir().await?;

        let digest = url_digest(url);
        let entry = self.dir.join(format!("{digest}.{CACHE_FILE_SUFFIX}"));

        let entry_lock = self
            .entry_locks
            .entry(digest.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = entry_lock.lock().await;
        let _file_lock = CacheLock::acquire(&self.dir, &digest)
            .await
            .with_context(|| format!("Failed to lock cache entry for {url}"))?;

        self.check_owner(&digest, url).await?;

        let refresh = self.force_refresh && !self.refreshed.contains(&digest);
        if !refresh && tokio::fs::metadata(&entry).await.map(|m| m.is_file()).unwrap_or(false) {
            debug!("Cache hit for {} at {}", url, entry.display());
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            self.record_owner(&digest, url).await?;
            return Ok(entry);
        }

        info!("Downloading: {}", url);
        let body = self.fetcher.fetch(url).await?;
        let text = String::from_utf8(body).map_err(|e| UrlIncludeError::DecodeFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        write_blocking(entry.clone(), text.into_bytes()).await?;
        self.record_owner(&digest, url).await?;
        self.refreshed.insert(digest);
        self.counters.fetches.fetch_add(1, Ordering::Relaxed);

        debug!("Cached {} at {}", url, entry.display());
        Ok(entry)
    }

    fn owner_path(&self, digest: &str) -> PathBuf {
        self.dir.join(format!("{digest}.{CACHE_OWNER_SUFFIX}"))
    }

    async fn check_owner(&self, digest: &str, url: &str) -> Result<()> {
        let owner_path = self.owner_path(digest);
        match tokio::fs::read_to_string(&owner_path).await {
            Ok(existing) if existing.trim_end() != url => Err(UrlIncludeError::DigestCollision {
                digest: digest.to_string(),
                existing_url: existing.trim_end().to_string(),
                url: url.to_string(),
            }
            .into()),
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(UrlIncludeError::FileSystemError {
                operation: "reading cache owner record".to_string(),
                path: owner_path.display().to_string(),
                reason: e.to_string(),
            }
            .into()),
        }
    }

    async fn record_owner(&self, digest: &str, url: &str) -> Result<()> {
        let owner_path = self.owner_path(digest);
        if tokio::fs::try_exists(&owner_path).await.unwrap_or(false) {
            return Ok(());
        }
        write_blocking(owner_path, format!("{url}\n").into_bytes()).await
    }
}

async fn write_blocking(path: PathBuf, content: Vec<u8>) -> Result<()> {
    tokio::task::spawn_blocking(move || atomic_write(&path, &content))
        .await
        .context("Failed to spawn blocking task for cache write")?
}
