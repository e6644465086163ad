//! Rewrite Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A rewrite error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for rewrite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be built from the given settings.
    #[display("could not configure HTTP client")]
    Client,
    /// The URL in the tag can't be turned into something fetchable.
    #[display("cannot resolve resource URL: {_0}")]
    Unresolvable(#[error(not(source))] String),
    /// The request failed before a response arrived (DNS, TLS, timeout).
    #[display("failed to fetch {_0}")]
    Fetch(#[error(not(source))] String),
    /// The server answered, but not with a success status.
    #[display("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
    /// The response body exceeds the configured size limit.
    #[display("{url} is larger than {limit} bytes")]
    TooLarge { url: String, limit: u64 },
    /// The hash cache or the exclusion list could not be read or written.
    #[display("hash cache error")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch(_) | Self::Cache => true,
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Client | Self::Unresolvable(_) | Self::TooLarge { .. } => false,
        }
    }
}
