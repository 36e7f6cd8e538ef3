//! The `build` command.

use super::CliConfig;
use crate::build::Builder;
use crate::config::ProjectConfig;
use crate::constants::DEFAULT_BUILD_JOBS;
use crate::core::UrlIncludeError;
use crate::fetch::HttpFetcher;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

/// Render every `*.md` document of SOURCE into `--out`.
///
/// Settings are read from `urlinclude.toml` in SOURCE when present. Remote
/// includes are cached in `<OUT>/_urlinclude` and reused by later builds.
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Documentation source directory
    source: PathBuf,

    /// Output directory
    #[arg(short, long)]
    out: PathBuf,

    /// Download every remote include again, once per build
    #[arg(long)]
    refresh: bool,

    /// Number of documents processed concurrently
    #[arg(short, long, default_value_t = DEFAULT_BUILD_JOBS)]
    jobs: usize,
}

impl BuildCommand {
    /// Runs the build and prints a summary.
    ///
    /// # Errors
    ///
    /// Fails when the source directory is missing, the configuration is
    /// invalid, or any document fails to build.
    pub async fn execute(self, config: &CliConfig) -> Result<()> {
        if !self.source.is_dir() {
            return Err(UrlIncludeError::ConfigError {
                message: format!("source directory '{}' does not exist", self.source.display()),
            }
            .into());
        }

        let mut project = ProjectConfig::load_from_dir(&self.source).await?;
        if self.refresh {
            project.force_refresh = true;
        }

        let fetcher = Arc::new(HttpFetcher::new(&project.network)?);
        let builder = Builder::new(project, &self.source, &self.out, fetcher)?
            .with_jobs(self.jobs)
            .with_progress(config.show_progress());
        let summary = builder.build().await?;

        if !config.quiet {
            println!(
                "{} Built {} document(s) into {}",
                "✓".green(),
                summary.documents,
                summary.out_dir.display()
            );
            println!(
                "  cache: {} hit(s), {} download(s)",
                summary.cache.hits, summary.cache.fetches
            );
        }
        Ok(())
    }
}
