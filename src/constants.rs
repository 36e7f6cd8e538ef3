//! Global constants used throughout the urlinclude codebase.
//!
//! Defaults for reference resolution, the cache layout and network access live
//! here so the configuration layer, the cache and the tests agree on them.

use std::time::Duration;

/// Host used to build GitHub raw and blob URLs.
pub const DEFAULT_GITHUB_HOST: &str = "https://github.com";

/// Branch used when a `github` reference does not name one.
pub const DEFAULT_BRANCH: &str = "master";

/// Name of the cache directory created next to the doctree directory.
pub const DEFAULT_CACHE_DIR_NAME: &str = "_urlinclude";

/// Name of the doctree directory inside the build output directory.
pub const DOCTREE_DIR_NAME: &str = ".doctrees";

/// Suffix of every cached artifact, independent of the fetched content type.
pub const CACHE_FILE_SUFFIX: &str = "py";

/// Suffix of the sidecar that records which URL owns a digest.
pub const CACHE_OWNER_SUFFIX: &str = "url";

/// Number of digest bytes kept for cache file names (16 hex characters).
pub const DIGEST_BYTES: usize = 8;

/// Project configuration file looked up in the documentation source directory.
pub const CONFIG_FILE_NAME: &str = "urlinclude.toml";

/// Timeout for a single remote fetch (30 seconds).
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of documents processed concurrently by a build.
pub const DEFAULT_BUILD_JOBS: usize = 1;
