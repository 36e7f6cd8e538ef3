//! Core types shared across urlinclude.
//!
//! Currently this is the error model: [`UrlIncludeError`] enumerates the
//! failure classes of resolution, caching and directive processing, and
//! [`ErrorContext`] pairs an error with user-facing details and suggestions.

pub mod error;

pub use error::{ErrorContext, UrlIncludeError, user_friendly_error};
