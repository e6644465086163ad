//! Content digests and `integrity` attribute values.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use exn::ResultExt;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};

/// Hash a resource for use in an `integrity` attribute.
///
/// SHA-256 over the raw bytes, encoded as standard base64 (with padding).
/// This is the value stored in the known hashes cache; the attribute itself
/// is built with [`Integrity`].
///
/// # Examples
///
/// ```
/// use sri_resource::hash_resource;
///
/// assert_eq!(
///     hash_resource(r#"alert("Hello, world!");"#),
///     "niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8=",
/// );
/// ```
pub fn hash_resource(content: impl AsRef<[u8]>) -> String {
    Algorithm::Sha256.digest(content)
}

/// Hash algorithms allowed in an `integrity` attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}
impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the raw (not encoded) digest in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Base64 digest of `content`.
    pub fn digest(&self, content: impl AsRef<[u8]>) -> String {
        let content = content.as_ref();
        match self {
            Self::Sha256 => BASE64.encode(Sha256::digest(content)),
            Self::Sha384 => BASE64.encode(Sha384::digest(content)),
            Self::Sha512 => BASE64.encode(Sha512::digest(content)),
        }
    }
}
impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl FromStr for Algorithm {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => exn::bail!(ErrorKind::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// The value of an `integrity` attribute, e.g. `sha256-niqXkYY...5A8=`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Integrity {
    pub algorithm: Algorithm,
    /// Base64-encoded digest.
    pub digest: String,
}
impl Integrity {
    /// Compute the SHA-256 integrity value of some content.
    pub fn of(content: impl AsRef<[u8]>) -> Self {
        Self { algorithm: Algorithm::Sha256, digest: hash_resource(content) }
    }

    /// Wrap an already computed SHA-256 digest (as stored in the known
    /// hashes cache).
    ///
    /// The digest is not re-validated here; use [`str::parse`] for
    /// untrusted input.
    pub fn sha256(digest: impl Into<String>) -> Self {
        Self { algorithm: Algorithm::Sha256, digest: digest.into() }
    }

    /// Returns `true` if `content` hashes to this digest.
    pub fn verify(&self, content: impl AsRef<[u8]>) -> bool {
        self.algorithm.digest(content) == self.digest
    }
}
impl fmt::Display for Integrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, self.digest)
    }
}
impl FromStr for Integrity {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let Some((algorithm, digest)) = s.split_once('-') else {
            exn::bail!(ErrorKind::InvalidIntegrity(s.to_string()));
        };
        let algorithm: Algorithm = algorithm.parse()?;
        let raw = BASE64.decode(digest).or_raise(|| ErrorKind::InvalidIntegrity(s.to_string()))?;
        if raw.len() != algorithm.output_len() {
            exn::bail!(ErrorKind::InvalidIntegrity(s.to_string()));
        }
        Ok(Self { algorithm, digest: digest.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"alert("Hello, world!");"#, "niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8=")]
    #[case("", "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=")]
    #[case("body{color:red}", "FcQqt3aNlV7AZnGV4zkQRVeCeJOxbMPnQSx258L803E=")]
    fn test_hash_resource(#[case] content: &str, #[case] expected: &str) {
        assert_eq!(hash_resource(content), expected);
    }

    #[test]
    fn test_hash_resource_is_deterministic() {
        let content = b"console.log(1);".to_vec();
        assert_eq!(hash_resource(&content), hash_resource(&content));
        assert_ne!(hash_resource(&content), hash_resource(b"console.log(2);"));
    }

    #[test]
    fn test_sha384() {
        assert_eq!(
            Algorithm::Sha384.digest("console.log(1);"),
            "JawyHuhqEMFMvdtX+VHylbI0hfJp2F7nvwFVRqqfuOoK5oW7TG/7V11Zs7zeFWIE"
        );
    }

    #[test]
    fn test_integrity_display() {
        let integrity = Integrity::of(r#"alert("Hello, world!");"#);
        assert_eq!(integrity.to_string(), "sha256-niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8=");
        assert!(integrity.verify(r#"alert("Hello, world!");"#));
        assert!(!integrity.verify("alert('tampered');"));
    }

    #[rstest]
    #[case("sha256-niqXkYYIkmWt0jYVFjVzcI+Q5nc3jzIdmbLXJqKD5A8=", Algorithm::Sha256)]
    #[case(" SHA256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU= ", Algorithm::Sha256)]
    #[case("sha384-JawyHuhqEMFMvdtX+VHylbI0hfJp2F7nvwFVRqqfuOoK5oW7TG/7V11Zs7zeFWIE", Algorithm::Sha384)]
    fn test_integrity_parse(#[case] input: &str, #[case] algorithm: Algorithm) {
        let integrity: Integrity = input.parse().unwrap();
        assert_eq!(integrity.algorithm, algorithm);
    }

    #[rstest]
    #[case("")]
    #[case("sha256")]
    #[case("md5-1B2M2Y8AsgTpgAmY7PhCfg==")]
    #[case("sha256-not base64!")]
    // Valid base64, wrong length for SHA-256.
    #[case("sha256-aGVsbG8=")]
    fn test_integrity_parse_invalid(#[case] input: &str) {
        assert!(input.parse::<Integrity>().is_err());
    }

    #[test]
    fn test_unsupported_algorithm_kind() {
        let err = "md5".parse::<Algorithm>().unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedAlgorithm("md5".to_string()));
    }
}
