//! Where resource bodies come from.

use async_trait::async_trait;
#[cfg(any(test, feature = "mock"))]
use std::collections::HashMap;
use std::sync::Arc;
#[cfg(any(test, feature = "mock"))]
use std::sync::atomic::{AtomicUsize, Ordering};
use url::Url;

use crate::error::Result;
#[cfg(any(test, feature = "mock", feature = "http"))]
use crate::error::ErrorKind;

/// Shared handle to a fetcher.
pub type FetcherHandle = Arc<dyn Fetcher + Send + Sync>;

/// Retrieves the exact bytes a browser would receive for a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body of `url`. Anything other than a successful response is
    /// an error.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>>;
}

/// Fetches over HTTP(S) with `reqwest`.
#[cfg(feature = "http")]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}
#[cfg(feature = "http")]
impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout` and refuse
    /// bodies larger than `max_bytes`.
    pub fn new(timeout: std::time::Duration, user_agent: &str, max_bytes: u64) -> Result<Self> {
        use exn::ResultExt;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .or_raise(|| ErrorKind::Client)?;
        Ok(Self { client, max_bytes })
    }
}
#[cfg(feature = "http")]
#[async_trait]
impl Fetcher for HttpFetcher {
    #[tracing::instrument(level = "debug", skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        use exn::ResultExt;
        let mut response =
            self.client.get(url.clone()).send().await.or_raise(|| ErrorKind::Fetch(url.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status { url: url.to_string(), status: status.as_u16() });
        }
        if let Some(length) = response.content_length() {
            check_size(url, length, self.max_bytes)?;
        }
        // The declared length may be missing or wrong; count what arrives.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.or_raise(|| ErrorKind::Fetch(url.to_string()))? {
            check_size(url, (body.len() + chunk.len()) as u64, self.max_bytes)?;
            body.extend_from_slice(&chunk);
        }
        tracing::debug!(bytes = body.len(), "Fetched resource");
        Ok(body)
    }
}

/// Fail with [`ErrorKind::TooLarge`] once `length` exceeds `limit`.
#[cfg(any(test, feature = "http"))]
fn check_size(url: &Url, length: u64, limit: u64) -> Result<()> {
    if length > limit {
        exn::bail!(ErrorKind::TooLarge { url: url.to_string(), limit });
    }
    Ok(())
}

/// Serves canned bodies; unknown URLs are a 404.
#[cfg(any(test, feature = "mock"))]
#[derive(Default)]
pub struct MockFetcher {
    bodies: HashMap<String, Vec<u8>>,
    requests: AtomicUsize,
}
#[cfg(any(test, feature = "mock"))]
impl MockFetcher {
    pub fn with_bodies<K, B>(bodies: impl IntoIterator<Item = (K, B)>) -> Self
    where
        K: Into<String>,
        B: Into<Vec<u8>>,
    {
        Self {
            bodies: bodies.into_iter().map(|(url, body)| (url.into(), body.into())).collect(),
            requests: AtomicUsize::new(0),
        }
    }

    /// How many times [`fetch()`](Fetcher::fetch) has been called.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}
#[cfg(any(test, feature = "mock"))]
#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.bodies.get(url.as_str()) {
            Some(body) => Ok(body.clone()),
            None => exn::bail!(ErrorKind::Status { url: url.to_string(), status: 404 }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 1024, true)]
    #[case(1024, 1024, true)]
    #[case(1025, 1024, false)]
    #[case(u64::MAX, 1024, false)]
    fn test_check_size(#[case] length: u64, #[case] limit: u64, #[case] allowed: bool) {
        let url = Url::parse("https://cdn.example.com/lib.js").unwrap();
        match check_size(&url, length, limit) {
            Ok(()) => assert!(allowed),
            Err(err) => {
                assert!(!allowed);
                assert_eq!(*err, ErrorKind::TooLarge { url: url.to_string(), limit });
            },
        }
    }

    #[tokio::test]
    async fn test_mock_fetcher() {
        let fetcher = MockFetcher::with_bodies([("https://cdn.example.com/lib.js", "lib();")]);
        let url = Url::parse("https://cdn.example.com/lib.js").unwrap();
        assert_eq!(fetcher.fetch(&url).await.unwrap(), b"lib();");
        let missing = Url::parse("https://cdn.example.com/missing.js").unwrap();
        let err = fetcher.fetch(&missing).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status { status: 404, .. }));
        assert_eq!(fetcher.requests(), 2);
    }
}
