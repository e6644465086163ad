//! Verification tokens for admin actions.
//!
//! Admin requests that change what the site enforces carry a token proving
//! that the acting user asked for this specific action recently. The
//! [`TokenValidator`] trait is what the action processor depends on;
//! [`Nonces`] is the implementation shipped with sri.

pub mod error;
mod nonces;

pub use crate::nonces::{DEFAULT_LIFETIME, Nonces};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub type ValidatorHandle = Arc<dyn TokenValidator + Send + Sync>;

/// The user session a token is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Session {
    pub user_id: u64,
    /// Opaque per-login secret (session cookie token or similar). Logging
    /// out and back in invalidates every token issued for the old session.
    pub token: String,
}
impl Session {
    pub fn new(user_id: u64, token: impl Into<String>) -> Self {
        Self { user_id, token: token.into() }
    }
}

/// Outcome of checking a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Issued during the current half of the token lifetime.
    Fresh,
    /// Issued during the previous half of the token lifetime; still valid.
    Aging,
    /// Unknown, expired, bound to something else, or already used.
    Invalid,
}
impl Verdict {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Checks (and consumes) verification tokens.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Verify `token` for `action` on behalf of `session`.
    ///
    /// A token that verifies successfully is consumed: presenting it a
    /// second time yields [`Verdict::Invalid`]. A token that fails
    /// verification is not recorded anywhere.
    async fn verify(&self, action: &str, session: &Session, token: &str) -> Result<Verdict>;
}
