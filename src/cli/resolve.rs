//! The `resolve` command.

use super::CliConfig;
use crate::config::ProjectConfig;
use crate::core::UrlIncludeError;
use crate::reference::{Override, ReferenceResolver};
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

/// Print the URL a reference resolves to, without fetching it.
#[derive(Args, Debug)]
pub struct ResolveCommand {
    /// Path of the file inside the repository
    path: String,

    /// GitHub repository as owner/repo
    #[arg(long)]
    github: Option<String>,

    /// Branch or tag (defaults to the configured default branch)
    #[arg(long)]
    branch: Option<String>,

    /// Complete URL, used verbatim when --github is absent
    #[arg(long)]
    url: Option<String>,

    /// Print the browsable blob URL instead of the raw content URL
    #[arg(long)]
    link: bool,

    /// Directory holding urlinclude.toml
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
}

impl ResolveCommand {
    /// Prints the final URL.
    ///
    /// # Errors
    ///
    /// Fails when the reference has no source, or `--link` is used without
    /// `--github`.
    pub async fn execute(self, _config: &CliConfig) -> Result<()> {
        let project = ProjectConfig::load_from_dir(&self.config_dir).await?;
        let resolver = ReferenceResolver::from_config(&project);

        let explicit = Override {
            github: self.github,
            branch: self.branch,
            url: self.url,
        };
        let resolved = if self.link {
            resolver.link_url(None, &explicit, &self.path)
        } else {
            resolver.include_url(None, &explicit, &self.path)
        };

        let url = resolved.map_err(|e| UrlIncludeError::ConfigError {
            message: e.to_string(),
        })?;
        println!("{url}");
        Ok(())
    }
}
