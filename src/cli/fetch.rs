//! The `fetch` command.

use super::CliConfig;
use crate::cache::ContentCache;
use crate::config::ProjectConfig;
use crate::fetch::HttpFetcher;
use crate::utils::progress::ProgressBar;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Download a URL into a cache directory and print the entry path.
///
/// An existing entry is reused unless `--refresh` is given.
#[derive(Args, Debug)]
pub struct FetchCommand {
    /// URL to cache
    url: String,

    /// Cache directory, e.g. `<out>/_urlinclude`
    #[arg(long)]
    cache_dir: PathBuf,

    /// Download again even if the entry exists
    #[arg(long)]
    refresh: bool,

    /// Directory holding urlinclude.toml
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
}

impl FetchCommand {
    /// Ensures the URL is cached.
    ///
    /// # Errors
    ///
    /// Fails on network, decode, filesystem and digest collision errors.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        let project = ProjectConfig::load_from_dir(&self.config_dir).await?;
        let fetcher = Arc::new(HttpFetcher::new(&project.network)?);
        let cache = ContentCache::new(&self.cache_dir, fetcher)
            .with_force_refresh(self.refresh || project.force_refresh);

        let spinner = ProgressBar::new_spinner(config.show_progress());
        spinner.set_message(format!("Fetching {}", self.url));
        let result = cache.ensure_cached(&self.url).await;
        spinner.finish_and_clear();

        println!("{}", result?.display());
        Ok(())
    }
}
