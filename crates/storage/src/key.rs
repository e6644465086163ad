//! Option key validation.
//!
//! Keys double as file names in the [`LocalBackend`](crate::backend::LocalBackend),
//! so they are restricted to a conservative character set that can never
//! escape the storage root.

use crate::error::{ErrorKind, Result};

/// Same limit as the `option_name` column most CMS option tables use.
pub const MAX_KEY_LENGTH: usize = 191;

/// Validates an option key.
///
/// Keys must be non-empty, at most [`MAX_KEY_LENGTH`] bytes, and contain only
/// ASCII letters, digits, `_` and `-`.
///
/// # Examples
///
/// ```
/// use sri_storage::validate_key;
/// assert!(validate_key("wpsri_known_hashes").is_ok());
/// assert!(validate_key("wpsri-excluded-hashes").is_ok());
/// assert!(validate_key("../etc/passwd").is_err());
/// assert!(validate_key("").is_err());
/// ```
pub fn validate(key: &str) -> Result<&str> {
    let valid = !key.is_empty()
        && key.len() <= MAX_KEY_LENGTH
        && key.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
    match valid {
        true => Ok(key),
        false => exn::bail!(ErrorKind::InvalidKey(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("wpsri_known_hashes")]
    #[case("wpsri_excluded_hashes")]
    #[case("A-Z_0-9")]
    #[case("x")]
    fn test_valid_keys(#[case] key: &str) {
        assert_eq!(validate(key).unwrap(), key);
    }

    #[rstest]
    #[case("")]
    #[case(" ")]
    #[case("..")]
    #[case("../escape")]
    #[case("nested/key")]
    #[case("back\\slash")]
    #[case("dotted.key")]
    #[case("null\0byte")]
    #[case("ünïcödé")]
    fn test_invalid_keys(#[case] key: &str) {
        let err = validate(key).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidKey(_)));
    }

    #[test]
    fn test_key_length() {
        assert!(validate(&"k".repeat(MAX_KEY_LENGTH)).is_ok());
        assert!(validate(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }
}
