//! Resource Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A resource error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for resource operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configured site URL is not an absolute http(s) URL.
    #[display("invalid site URL: {_0}")]
    InvalidSiteUrl(#[error(not(source))] String),
    /// An integrity value could not be parsed.
    #[display("invalid integrity value: {_0}")]
    InvalidIntegrity(#[error(not(source))] String),
    /// The integrity value names a hash algorithm we don't know about.
    #[display("unsupported hash algorithm: {_0}")]
    UnsupportedAlgorithm(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Parsing the same input twice gives the same answer.
        false
    }
}
