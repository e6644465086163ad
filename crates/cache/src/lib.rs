//! Known hash cache and URL exclusion list.
//!
//! Both collections live in the injected option store and are loaded in full
//! on every call; nothing is cached in memory between calls. The store, not
//! this crate, is the source of truth.
//!
//! # Architecture
//! The crate manages two options under a common [`Prefix`]:
//! - **Known hashes** (`{prefix}known_hashes`): resource URL to base64
//!   SHA-256 digest. At most one digest per URL; writing a URL again
//!   replaces its digest.
//! - **Excluded URLs** (`{prefix}excluded_hashes`): an ordered,
//!   duplicate-free list of URLs that never get an `integrity` attribute.

pub mod error;
mod excluded;
mod known;
mod prefix;

pub use crate::excluded::ExcludedUrls;
pub use crate::known::KnownHashes;
pub use crate::prefix::{DEFAULT_PREFIX, Prefix};

use crate::error::{ErrorKind, Result};

/// Canonical form of a resource URL, used as the key in both collections.
///
/// Surrounding whitespace is stripped; URLs that are empty or still contain
/// whitespace or control characters are rejected, since they can't have
/// come from a well-formed `src`/`href` attribute.
pub fn canonical_url(url: &str) -> Result<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() || trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        exn::bail!(ErrorKind::InvalidUrl(url.to_string()));
    }
    Ok(trimmed.to_string())
}
