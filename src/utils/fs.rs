//! File system helpers for cache entries and build output.
//!
//! Cache entries must never be observed half-written: a later build treats
//! any existing entry as a valid cache hit. [`atomic_write`] therefore writes
//! to a temporary file in the destination directory and renames it into place.

use crate::core::UrlIncludeError;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Ensures a directory exists, creating it and all parents if necessary.
///
/// Calling this for a directory that already exists is a no-op.
///
/// # Errors
///
/// Returns [`UrlIncludeError::FileSystemError`] if the path exists but is not a
/// directory or creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(UrlIncludeError::FileSystemError {
            operation: "creating directory".to_string(),
            path: path.display().to_string(),
            reason: "path exists but is not a directory".to_string(),
        }
        .into());
    }

    std::fs::create_dir_all(path).map_err(|e| UrlIncludeError::FileSystemError {
        operation: "creating directory".to_string(),
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Atomically writes bytes to a file using a write-then-rename strategy.
///
/// The temporary file is created next to `path` so the final rename never
/// crosses file systems. If any step fails the temporary file is removed and
/// `path` is left untouched.
///
/// # Errors
///
/// Returns [`UrlIncludeError::FileSystemError`] naming `path` when the parent
/// directory is missing or unwritable, or the rename fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let fs_error = |reason: String| UrlIncludeError::FileSystemError {
        operation: "writing file".to_string(),
        path: path.display().to_string(),
        reason,
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".tmp-")
        .tempfile_in(parent)
        .map_err(|e| fs_error(e.to_string()))?;

    temp.write_all(content).map_err(|e| fs_error(e.to_string()))?;
    temp.as_file().sync_all().map_err(|e| fs_error(e.to_string()))?;
    temp.persist(path).map_err(|e| fs_error(e.error.to_string()))?;
    Ok(())
}

/// Normalizes a path by resolving `.` and `..` components without touching
/// the file system.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    components.iter().collect()
}

/// Makes a path absolute against the current directory and normalizes it.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve absolute path for {}", path.display()))?;
    Ok(normalize_path(&absolute))
}

/// Expresses `target` relative to the directory `base`.
///
/// Both paths are made absolute first. On Windows, paths on different drives
/// have no relative form and `target` is returned absolute.
///
/// ```rust
/// use urlinclude::utils::fs::relative_path;
/// use std::path::{Path, PathBuf};
///
/// let rel = relative_path(Path::new("/out/_urlinclude/ab.py"), Path::new("/src/guide")).unwrap();
/// assert_eq!(rel, PathBuf::from("../../out/_urlinclude/ab.py"));
/// ```
///
/// # Errors
///
/// Returns an error if either path cannot be made absolute.
pub fn relative_path(target: &Path, base: &Path) -> Result<PathBuf> {
    let target = absolute_path(target)?;
    let base = absolute_path(base)?;

    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    if target_parts.first() != base_parts.first() {
        return Ok(target);
    }

    let common = target_parts.iter().zip(&base_parts).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in common..base_parts.len() {
        relative.push("..");
    }
    for part in &target_parts[common..] {
        relative.push(part.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Ok(relative)
}

/// Renders a path with forward slashes, as written in document sources.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
