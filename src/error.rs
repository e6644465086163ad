//! CLI Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("option storage error")]
    Storage,
    #[display("hash cache error")]
    Cache,
    #[display("nonce error")]
    Nonce,
    #[display("admin action failed")]
    Action,
    #[display("nothing recorded for {_0}")]
    NotFound(#[error(not(source))] String),
    #[display("could not read {_0}")]
    Input(#[error(not(source))] String),
    #[display("invalid argument: {_0}")]
    InvalidArgument(#[error(not(source))] String),
}
