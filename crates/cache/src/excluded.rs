//! URLs exempted from integrity enforcement.

use exn::ResultExt;
use sri_storage::StoreHandle;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{Prefix, canonical_url};

/// Ordered list of URLs that never get an `integrity` attribute.
///
/// A URL appears at most once. Order is insertion order; it carries no
/// meaning beyond [`position()`](Self::position).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use sri_cache::{ExcludedUrls, Prefix};
/// use sri_storage::backend::MockBackend;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> sri_cache::error::Result<()> {
/// let excluded = ExcludedUrls::new(Arc::new(MockBackend::default()), &Prefix::default());
/// excluded.add("https://fonts.googleapis.com/css?family=Lato").await?;
/// assert!(excluded.contains("https://fonts.googleapis.com/css?family=Lato").await?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ExcludedUrls {
    store: StoreHandle,
    key: String,
}
impl ExcludedUrls {
    pub fn new(store: StoreHandle, prefix: &Prefix) -> Self {
        Self { store, key: prefix.excluded_hashes() }
    }

    async fn load(&self) -> Result<Vec<String>> {
        let urls = sri_storage::load(self.store.as_ref(), &self.key)
            .await
            .or_raise(|| ErrorKind::Storage(self.store.name().to_string()))?;
        Ok(urls.unwrap_or_default())
    }

    async fn save(&self, urls: &[String]) -> Result<()> {
        sri_storage::save(self.store.as_ref(), &self.key, urls)
            .await
            .or_raise(|| ErrorKind::Storage(self.store.name().to_string()))
    }

    /// All excluded URLs, in insertion order.
    pub async fn all(&self) -> Result<Vec<String>> {
        self.load().await
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.load().await?.is_empty())
    }

    pub async fn contains(&self, url: &str) -> Result<bool> {
        Ok(self.position(url).await?.is_some())
    }

    /// Index of the URL in insertion order.
    pub async fn position(&self, url: &str) -> Result<Option<usize>> {
        let url = canonical_url(url)?;
        Ok(self.load().await?.iter().position(|excluded| *excluded == url))
    }

    /// Exclude a URL. Idempotent: returns `false` if it was already excluded.
    #[instrument(level = "debug", skip(self))]
    pub async fn add(&self, url: &str) -> Result<bool> {
        let url = canonical_url(url)?;
        let mut urls = self.load().await?;
        if urls.contains(&url) {
            tracing::debug!("URL already excluded");
            return Ok(false);
        }
        urls.push(url);
        self.save(&urls).await?;
        tracing::info!(count = urls.len(), "URL excluded from integrity checks");
        Ok(true)
    }

    /// Stop excluding a URL. Returns `false` (and changes nothing) if it
    /// wasn't excluded.
    #[instrument(level = "debug", skip(self))]
    pub async fn remove(&self, url: &str) -> Result<bool> {
        let url = canonical_url(url)?;
        let mut urls = self.load().await?;
        let Some(index) = urls.iter().position(|excluded| *excluded == url) else {
            tracing::debug!("URL was not excluded");
            return Ok(false);
        };
        urls.remove(index);
        self.save(&urls).await?;
        tracing::info!(count = urls.len(), "URL included in integrity checks");
        Ok(true)
    }

    /// Add (`excluded == true`) or remove (`excluded == false`) a URL.
    pub async fn update(&self, url: &str, excluded: bool) -> Result<bool> {
        match excluded {
            true => self.add(url).await,
            false => self.remove(url).await,
        }
    }
}
