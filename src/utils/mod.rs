//! Shared utilities: file system helpers and progress indicators.
//!
//! - [`fs`] - atomic writes, directory creation and relative path computation
//! - [`progress`] - progress bars and spinners for the CLI

pub mod fs;
pub mod progress;
