//! Config Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A configuration error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration source exists but couldn't be parsed or doesn't fit
    /// the expected shape.
    #[display("could not load configuration")]
    Load,
    /// A configuration file was named explicitly but doesn't exist.
    #[display("configuration file not found: {}", _0.display())]
    FileNotFound(#[error(not(source))] PathBuf),
    /// The file extension isn't one of `toml`, `yaml`, `yml` or `json`.
    #[display("unsupported configuration format: {}", _0.display())]
    UnsupportedFormat(#[error(not(source))] PathBuf),
    /// A required setting has no value.
    #[display("missing required setting `{_0}`")]
    Missing(#[error(not(source))] &'static str),
    /// A setting has a value that can't be used.
    #[display("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Configuration needs editing, not retrying.
        false
    }
}
