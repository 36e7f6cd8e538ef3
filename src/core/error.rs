//! Error handling for urlinclude.
//!
//! Domain failures are modelled by [`UrlIncludeError`]. Library functions
//! return `anyhow::Result` and attach a `UrlIncludeError` where the caller
//! needs to tell failure classes apart (configuration, network, decoding,
//! filesystem, digest collisions, directive syntax). The CLI turns any error
//! into an [`ErrorContext`] with details and a suggestion through
//! [`user_friendly_error`].
//!
//! ```rust,no_run
//! use urlinclude::core::{UrlIncludeError, user_friendly_error};
//!
//! let error = UrlIncludeError::HttpStatus {
//!     url: "https://github.com/org/repo/raw/master/a.py".to_string(),
//!     status: 404,
//! };
//! let ctx = user_friendly_error(anyhow::Error::new(error));
//! ctx.display();
//! ```

use crate::reference::ReferenceError;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Failure classes surfaced by resolution, caching and directive processing.
#[derive(Error, Debug, Clone)]
pub enum UrlIncludeError {
    /// A directive or role could not be resolved to a final URL.
    ///
    /// Attributable to the document and line of the offending invocation.
    #[error("Reference error in '{docname}' line {line}: {reason}")]
    ReferenceConfig {
        /// Document containing the invocation
        docname: String,
        /// One-based line of the invocation
        line: usize,
        /// Why the reference could not be resolved
        #[source]
        reason: ReferenceError,
    },

    /// The remote host could not be reached or the transfer failed.
    #[error("Failed to fetch {url}: {reason}")]
    FetchFailed {
        /// URL being fetched
        url: String,
        /// Transport-level reason
        reason: String,
    },

    /// The remote host answered with a non-success status.
    #[error("Fetching {url} returned HTTP {status}")]
    HttpStatus {
        /// URL being fetched
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// The fetched body is not UTF-8 text.
    #[error("Content fetched from {url} is not valid UTF-8 text")]
    DecodeFailed {
        /// URL the body came from
        url: String,
        /// Decoder message
        reason: String,
    },

    /// A cache or output path could not be created or written.
    #[error("File system error while {operation}: {path}")]
    FileSystemError {
        /// What was being done
        operation: String,
        /// Path involved
        path: String,
        /// Underlying I/O message
        reason: String,
    },

    /// Two distinct URLs produced the same cache digest.
    #[error("Cache digest {digest} already belongs to {existing_url}, cannot cache {url}")]
    DigestCollision {
        /// The shared digest
        digest: String,
        /// URL recorded for the digest
        existing_url: String,
        /// URL that collided with it
        url: String,
    },

    /// A directive block is malformed.
    #[error("Invalid directive in '{docname}' line {line}: {message}")]
    DirectiveSyntax {
        /// Document containing the block
        docname: String,
        /// One-based line of the problem
        line: usize,
        /// What is wrong
        message: String,
    },

    /// A directive name has no registered handler.
    #[error("Unknown directive '{name}' in '{docname}' line {line}")]
    UnknownDirective {
        /// Directive name as written
        name: String,
        /// Document containing the block
        docname: String,
        /// One-based line of the block
        line: usize,
    },

    /// A directive received an option outside its option spec.
    #[error("Unknown option ':{option}:' for directive '{directive}' in '{docname}' line {line}")]
    UnknownOption {
        /// Directive name
        directive: String,
        /// Rejected option key
        option: String,
        /// Document containing the block
        docname: String,
        /// One-based line of the block
        line: usize,
    },

    /// The configuration file is not valid TOML for [`crate::config::ProjectConfig`].
    #[error("Invalid configuration file {file}")]
    ConfigParseError {
        /// Configuration file path
        file: String,
        /// Parser message
        reason: String,
    },

    /// A configuration value is unusable.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },
}

impl UrlIncludeError {
    /// True for failures caused by talking to the remote side.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::FetchFailed { .. } | Self::HttpStatus { .. })
    }
}

/// An error enriched with optional details and a suggestion for the user.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: UrlIncludeError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Wraps an error without details or suggestion.
    #[must_use]
    pub const fn new(error: UrlIncludeError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Adds a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Adds details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Prints the error to stderr with colored labels.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Converts any error into an [`ErrorContext`] for display.
///
/// The chain is searched for a [`UrlIncludeError`]; outer context messages are
/// kept as details so the user still sees which document failed.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let outer: Vec<String> = error
        .chain()
        .take_while(|cause| cause.downcast_ref::<UrlIncludeError>().is_none())
        .map(ToString::to_string)
        .collect();

    if let Some(domain) = error.chain().find_map(|cause| cause.downcast_ref::<UrlIncludeError>()) {
        let mut ctx = create_error_context(domain.clone());
        if !outer.is_empty() {
            let outer = outer.join(": ");
            ctx.details = Some(match ctx.details.take() {
                Some(details) => format!("{outer}: {details}"),
                None => outer,
            });
        }
        return ctx;
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(UrlIncludeError::FileSystemError {
            operation: "accessing a file".to_string(),
            path: "unknown".to_string(),
            reason: io_error.to_string(),
        })
        .with_suggestion("Check permissions on the source and output directories");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(UrlIncludeError::ConfigError {
        message,
    })
}

fn create_error_context(error: UrlIncludeError) -> ErrorContext {
    match &error {
        UrlIncludeError::ReferenceConfig {
            reason,
            ..
        } => {
            let suggestion = match reason {
                ReferenceError::MissingSource => {
                    "Add a ':github: owner/repo' or ':url: <address>' option, or register a default with a 'urlinclude' directive"
                }
                ReferenceError::MissingGithub => {
                    "Register the repository with '.. urlinclude::' and ':github: owner/repo' before using :giturl:"
                }
                ReferenceError::EmptyField {
                    ..
                } => "Give the option a value or remove it",
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }
        UrlIncludeError::FetchFailed {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Check your network connection and the [network] proxy settings, then rebuild"),
        UrlIncludeError::HttpStatus {
            status,
            ..
        } => {
            let suggestion = if *status == 404 {
                "Check the repository, branch and path; private repositories are not supported"
            } else {
                "The server rejected the request; try again later or check the URL"
            };
            ErrorContext::new(error.clone()).with_suggestion(suggestion)
        }
        UrlIncludeError::DecodeFailed {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Only text files can be included; point the reference at a UTF-8 text file"),
        UrlIncludeError::FileSystemError {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_details(reason.clone())
            .with_suggestion("Check that the output directory exists and is writable"),
        UrlIncludeError::DigestCollision {
            digest,
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion(format!(
                "Remove the cache entry {digest} (and its .url file) from the cache directory and rebuild"
            )),
        UrlIncludeError::DirectiveSyntax {
            ..
        }
        | UrlIncludeError::UnknownOption {
            ..
        } => ErrorContext::new(error.clone()).with_suggestion(
            "Directive options go on indented lines of the form ':key: value' directly below the directive",
        ),
        UrlIncludeError::UnknownDirective {
            ..
        } => ErrorContext::new(error.clone())
            .with_suggestion("Supported directives are 'urlinclude' and 'literalinclude'"),
        UrlIncludeError::ConfigParseError {
            reason,
            ..
        } => ErrorContext::new(error.clone())
            .with_details(reason.clone())
            .with_suggestion("Check the TOML syntax and key names in urlinclude.toml"),
        UrlIncludeError::ConfigError {
            ..
        } => ErrorContext::new(error.clone()),
    }
}
