//! Nonce Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! An invalid token is a [`Verdict`](crate::Verdict), not an error. Errors
//! are reserved for the validator itself being unusable.

use derive_more::{Display, Error};

/// A nonce error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for nonce operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// No signing secret configured.
    #[display("nonce secret is empty")]
    MissingSecret,
    /// Consumed tokens could not be read or recorded.
    #[display("option store error ({_0})")]
    Storage(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}
