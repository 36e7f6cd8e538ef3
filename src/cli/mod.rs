//! Command-line interface for urlinclude.
//!
//! # Commands
//!
//! - `build` - Render a documentation tree, downloading remote includes
//! - `resolve` - Print the URL a reference resolves to
//! - `fetch` - Pull a single URL into a cache directory
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Debug logging
//! - `--quiet` / `-q` - Errors only, no summaries
//! - `--no-progress` - Disable progress bars
//!
//! Logging goes to stderr through `tracing-subscriber`. Without `--verbose`
//! or `--quiet` the `RUST_LOG` filter is honoured, defaulting to `info` so
//! that downloads are announced.
//!
//! # Examples
//!
//! ```bash
//! urlinclude build docs --out _build
//! urlinclude build docs --out _build --refresh --jobs 4
//! urlinclude resolve lib/mod.py --github org/repo --branch v2
//! urlinclude resolve lib/mod.py --github org/repo --link
//! urlinclude fetch https://example.com/setup.py --cache-dir _build/_urlinclude
//! ```

mod build;
mod fetch;
mod resolve;

pub use build::BuildCommand;
pub use fetch::FetchCommand;
pub use resolve::ResolveCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter directive; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,
    /// Suppress summaries on stdout
    pub quiet: bool,
    pub no_progress: bool,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Progress bars are shown unless disabled or quiet.
    #[must_use]
    pub fn show_progress(&self) -> bool {
        !self.no_progress && !self.quiet
    }

    /// Installs the global tracing subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
    }
}

/// Remote literal includes for documentation builds.
#[derive(Parser, Debug)]
#[command(
    name = "urlinclude",
    about = "Include remote files in documentation builds",
    version,
    long_about = "urlinclude renders markdown documentation whose literalinclude directives may point at \
                  a URL or a file in a GitHub repository. Remote files are downloaded once into a \
                  content-addressed cache beside the build output."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars and spinners.
    #[arg(long, global = true)]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a documentation tree into an output directory
    Build(BuildCommand),
    /// Print the final URL of a reference
    Resolve(ResolveCommand),
    /// Download a URL into a cache directory
    Fetch(FetchCommand),
}

impl Cli {
    /// Runs the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error for the caller to render.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translates the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            quiet: self.quiet,
            no_progress: self.no_progress,
        }
    }

    /// Runs the selected command with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the command's error for the caller to render.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Build(cmd) => cmd.execute(&config).await,
            Commands::Resolve(cmd) => cmd.execute(&config).await,
            Commands::Fetch(cmd) => cmd.execute(&config).await,
        }
    }
}
