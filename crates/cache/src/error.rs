//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// A URL that isn't in a collection is never an error.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The option store failed; see the child error for details.
    #[display("option store error ({_0})")]
    Storage(#[error(not(source))] String),
    /// The URL can't be used as a cache key.
    #[display("invalid resource URL: {_0:?}")]
    InvalidUrl(#[error(not(source))] String),
    /// The prefix would produce invalid option keys.
    #[display("invalid option prefix: {_0:?}")]
    InvalidPrefix(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
