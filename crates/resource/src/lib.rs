//! Resource classification and digests for Subresource Integrity.
//!
//! Two small building blocks used by everything else in the workspace:
//!
//! - [`Origin`] decides whether a script/stylesheet URL is served by the site
//!   itself (same scheme, host and port) and resolves relative URLs against
//!   the site so they can be fetched.
//! - [`hash_resource`] computes the base64 SHA-256 digest embedded in an
//!   `integrity` attribute, and [`Integrity`] is the attribute value itself.

mod digest;
pub mod error;
mod origin;

pub use crate::digest::{Algorithm, Integrity, hash_resource};
pub use crate::origin::Origin;
