//! Integration test suite for urlinclude
//!
//! End-to-end tests of documentation builds through the library API and the
//! `urlinclude` binary. Nothing here touches the network: library tests use
//! a counting in-memory fetcher, binary tests use `file://` URLs.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **build**: Full builds with overrides, includes, roles and caching
//! - **cli**: The `build`, `resolve` and `fetch` commands

mod build;
mod cli;

use std::path::Path;

/// Convert a path to a file:// URL string, properly handling Windows paths
pub fn path_to_file_url(path: &Path) -> String {
    let path_str = path.display().to_string().replace('\\', "/");
    if path_str.starts_with('/') {
        format!("file://{path_str}")
    } else {
        format!("file:///{path_str}")
    }
}
