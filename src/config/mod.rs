//! Project configuration for urlinclude builds.
//!
//! The configuration lives in an optional `urlinclude.toml` in the
//! documentation source directory. Every key has a default, so a missing file
//! or an empty file behaves exactly like the built-in settings.
//!
//! ```toml
//! github_host = "https://github.com"
//! default_branch = "master"
//! cache_dir_name = "_urlinclude"
//! force_refresh = false
//!
//! [network]
//! timeout_secs = 30
//! proxy = "http://proxy.internal:3128"
//! user_agent = "urlinclude/0.1.0"
//! ```
//!
//! The `[network]` table is handed to the HTTP fetcher; the other keys shape
//! reference resolution and the cache layout.

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_BRANCH, DEFAULT_CACHE_DIR_NAME, DEFAULT_FETCH_TIMEOUT,
    DEFAULT_GITHUB_HOST,
};
use crate::core::UrlIncludeError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

fn default_github_host() -> String {
    DEFAULT_GITHUB_HOST.to_string()
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_cache_dir_name() -> String {
    DEFAULT_CACHE_DIR_NAME.to_string()
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_FETCH_TIMEOUT.as_secs()
}

fn default_user_agent() -> String {
    format!("urlinclude/{}", env!("CARGO_PKG_VERSION"))
}

/// Settings for a documentation build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Host used for GitHub raw and blob URLs
    #[serde(default = "default_github_host")]
    pub github_host: String,

    /// Branch used when a `github` reference names none
    #[serde(default = "default_branch")]
    pub default_branch: String,

    /// Directory name of the download cache, created beside the doctree directory
    #[serde(default = "default_cache_dir_name")]
    pub cache_dir_name: String,

    /// Re-fetch every referenced URL once per build instead of trusting the cache
    #[serde(default)]
    pub force_refresh: bool,

    /// Network settings for remote fetches
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            github_host: default_github_host(),
            default_branch: default_branch(),
            cache_dir_name: default_cache_dir_name(),
            force_refresh: false,
            network: NetworkConfig::default(),
        }
    }
}

/// Network settings honoured by the HTTP fetcher.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Proxy applied to every request (`http://`, `https://` or `socks5://`)
    #[serde(default)]
    pub proxy: Option<String>,

    /// `User-Agent` header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            proxy: None,
            user_agent: default_user_agent(),
        }
    }
}

impl NetworkConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProjectConfig {
    /// Loads `urlinclude.toml` from `dir`, falling back to defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed or validated.
    pub async fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if fs::try_exists(&path).await.unwrap_or(false) {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self::default())
        }
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`UrlIncludeError::ConfigParseError`] for malformed TOML and
    /// [`UrlIncludeError::ConfigError`] for values that fail validation.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            UrlIncludeError::ConfigParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot work at build time.
    ///
    /// # Errors
    ///
    /// Returns [`UrlIncludeError::ConfigError`] describing the first bad value.
    pub fn validate(&self) -> Result<(), UrlIncludeError> {
        let invalid = |message: String| UrlIncludeError::ConfigError {
            message,
        };

        if !(self.github_host.starts_with("http://") || self.github_host.starts_with("https://")) {
            return Err(invalid(format!(
                "github_host must be an http(s) URL, got '{}'",
                self.github_host
            )));
        }
        if self.default_branch.trim().is_empty() {
            return Err(invalid("default_branch must not be empty".to_string()));
        }
        if self.cache_dir_name.is_empty()
            || self.cache_dir_name.contains(['/', '\\'])
            || self.cache_dir_name == ".."
        {
            return Err(invalid(format!(
                "cache_dir_name must be a plain directory name, got '{}'",
                self.cache_dir_name
            )));
        }
        if self.network.timeout_secs == 0 {
            return Err(invalid("network.timeout_secs must be greater than zero".to_string()));
        }
        Ok(())
    }
}
