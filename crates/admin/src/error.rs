//! Admin Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An admin error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for admin operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing, invalid, expired or reused verification token. Nothing was
    /// changed.
    #[display("not authorized to {_0}")]
    Unauthorized(#[error(not(source))] String),
    /// Neither `exclude` nor `include`.
    #[display("unknown action: {_0:?}")]
    UnknownAction(#[error(not(source))] String),
    /// The token validator itself failed.
    #[display("token validation failed")]
    Validator,
    /// The exclusion list could not be read or written.
    #[display("exclusion list error")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Unauthorized needs a new token, not a retry.
        matches!(self, Self::Validator | Self::Cache)
    }
}
