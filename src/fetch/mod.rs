//! Fetching remote file content.
//!
//! The cache depends on the [`UrlFetcher`] trait rather than on a concrete
//! client, so builds use [`HttpFetcher`] while tests substitute a counting
//! fake. Fetch errors are classified as [`UrlIncludeError::FetchFailed`] or
//! [`UrlIncludeError::HttpStatus`]; neither is retried.
//!
//! # Supported Schemes
//!
//! - `http://` and `https://` through `reqwest`, honouring the project's
//!   [`NetworkConfig`] (timeout, proxy, user agent)
//! - `file://` read from the local file system, for vendored mirrors and
//!   offline builds

use crate::config::NetworkConfig;
use crate::core::UrlIncludeError;
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Url;
use std::path::PathBuf;
use tracing::debug;

/// Source of remote file bytes.
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    /// Returns the complete body behind `url`.
    ///
    /// # Errors
    ///
    /// Implementations report failures as [`UrlIncludeError`] network variants.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetcher backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Builds a client from the network configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UrlIncludeError::ConfigError`] for an unusable proxy URL or
    /// when the TLS backend cannot be initialised.
    pub fn new(config: &NetworkConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| UrlIncludeError::ConfigError {
                message: format!("invalid network.proxy '{proxy}': {e}"),
            })?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build().map_err(|e| UrlIncludeError::ConfigError {
            message: format!("failed to initialise HTTP client: {e}"),
        })?;

        Ok(Self {
            client,
        })
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        if url.starts_with("file://") {
            return read_file_url(url).await;
        }

        debug!("GET {}", url);
        let response = self.client.get(url).send().await.map_err(|e| {
            UrlIncludeError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(UrlIncludeError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| UrlIncludeError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

/// Converts a `file://` URL into a local path.
///
/// Percent-escapes are decoded and a `localhost` authority is accepted.
/// Returns `None` for other schemes, other hosts and malformed URLs.
#[must_use]
pub fn file_url_to_path(url: &str) -> Option<PathBuf> {
    let parsed = Url::parse(url).ok()?;
    if parsed.scheme() != "file" {
        return None;
    }
    parsed.to_file_path().ok()
}

async fn read_file_url(url: &str) -> Result<Vec<u8>> {
    let path = file_url_to_path(url).ok_or_else(|| UrlIncludeError::FetchFailed {
        url: url.to_string(),
        reason: "not a local file URL".to_string(),
    })?;

    debug!("Reading {} for {}", path.display(), url);
    tokio::fs::read(&path).await.map_err(|e| {
        UrlIncludeError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}
