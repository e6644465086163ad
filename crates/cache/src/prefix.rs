use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use sri_storage::validate_key;
use std::fmt;

/// Prefix historically used for every option the plugin owns.
pub const DEFAULT_PREFIX: &str = "wpsri_";

const KNOWN_HASHES: &str = "known_hashes";
const EXCLUDED_HASHES: &str = "excluded_hashes";

/// Namespace for option keys, so that several sites (or test runs) can share
/// one option store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix(String);
impl Prefix {
    pub fn new(prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        // The longest suffix we append decides whether the prefix fits.
        validate_key(&format!("{prefix}{EXCLUDED_HASHES}")).or_raise(|| ErrorKind::InvalidPrefix(prefix.clone()))?;
        Ok(Self(prefix))
    }

    /// Option key for `name` under this prefix.
    pub fn key(&self, name: &str) -> String {
        format!("{}{}", self.0, name)
    }

    pub fn known_hashes(&self) -> String {
        self.key(KNOWN_HASHES)
    }

    pub fn excluded_hashes(&self) -> String {
        self.key(EXCLUDED_HASHES)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
impl Default for Prefix {
    fn default() -> Self {
        Self(DEFAULT_PREFIX.to_string())
    }
}
impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
