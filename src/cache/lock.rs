//! Per-digest file locks for cache entries.
//!
//! Two builds sharing an output tree must not both download the same URL or
//! interleave writes of the same entry. Every cache lookup holds an exclusive
//! OS lock on `{cache_dir}/.locks/{digest}.lock` until its [`CacheLock`] is
//! dropped. Lock files are never removed.

use crate::core::UrlIncludeError;
use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Name of the lock directory inside the cache directory.
pub const LOCKS_DIR: &str = ".locks";

/// Exclusive hold on one cache digest.
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Path of the lock file guarding `digest`.
    #[must_use]
    pub fn lock_path(cache_dir: &Path, digest: &str) -> PathBuf {
        cache_dir.join(LOCKS_DIR).join(format!("{digest}.lock"))
    }

    /// Waits for and takes the lock on `digest`.
    ///
    /// Blocking happens on tokio's blocking pool, so other documents keep
    /// building while this one waits.
    ///
    /// # Errors
    ///
    /// Returns [`UrlIncludeError::FileSystemError`] when the lock file cannot
    /// be created, or an error when the file system refuses the lock.
    pub async fn acquire(cache_dir: &Path, digest: &str) -> Result<Self> {
        let path = Self::lock_path(cache_dir, digest);
        if let Some(locks_dir) = path.parent() {
            tokio::fs::create_dir_all(locks_dir).await.map_err(|e| {
                UrlIncludeError::FileSystemError {
                    operation: "creating cache locks directory".to_string(),
                    path: locks_dir.display().to_string(),
                    reason: e.to_string(),
                }
            })?;
        }

        let file = open_lock_file(&path)?;
        let file = tokio::task::spawn_blocking(move || {
            file.lock_exclusive().map(|()| file)
        })
        .await
        .context("Lock task panicked")?
        .with_context(|| format!("Failed to lock cache digest {digest}"))?;

        tracing::trace!("Locked {}", path.display());
        Ok(Self {
            file,
            path,
        })
    }

    /// Path of the held lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(path: &Path) -> Result<File> {
    OpenOptions::new().create(true).truncate(false).write(true).open(path).map_err(|e| {
        UrlIncludeError::FileSystemError {
            operation: "opening cache lock".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        // std's File::unlock shadows the fs4 method on newer toolchains
        #[allow(unstable_name_collisions)]
        let unlocked = self.file.unlock();
        if let Err(e) = unlocked {
            tracing::warn!("Failed to release cache lock {}: {}", self.path.display(), e);
        }
    }
}
