//! URL to digest cache.

use exn::ResultExt;
use sri_storage::StoreHandle;
use std::collections::BTreeMap;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{Prefix, canonical_url};

type Hashes = BTreeMap<String, String>;

/// Cache of resource digests, keyed by URL.
///
/// Entries are created the first time a resource is fetched and hashed,
/// replaced when its content changes, and deleted explicitly (for example,
/// when a dependency is upgraded and the old URL's digest is stale).
///
/// Every method loads the whole mapping from the store; mutations write the
/// whole mapping back.
#[derive(Clone)]
pub struct KnownHashes {
    store: StoreHandle,
    key: String,
}
impl KnownHashes {
    pub fn new(store: StoreHandle, prefix: &Prefix) -> Self {
        Self { store, key: prefix.known_hashes() }
    }

    async fn load(&self) -> Result<Hashes> {
        let hashes = sri_storage::load(self.store.as_ref(), &self.key)
            .await
            .or_raise(|| ErrorKind::Storage(self.store.name().to_string()))?;
        Ok(hashes.unwrap_or_default())
    }

    async fn save(&self, hashes: &Hashes) -> Result<()> {
        sri_storage::save(self.store.as_ref(), &self.key, hashes)
            .await
            .or_raise(|| ErrorKind::Storage(self.store.name().to_string()))
    }

    /// Every known URL and its digest.
    pub async fn all(&self) -> Result<Hashes> {
        self.load().await
    }

    /// The digest recorded for a URL, if any.
    #[instrument(level = "debug", skip(self))]
    pub async fn get(&self, url: &str) -> Result<Option<String>> {
        let url = canonical_url(url)?;
        Ok(self.load().await?.remove(&url))
    }

    /// Record the digest for a URL, replacing any previous digest.
    #[instrument(level = "debug", skip(self))]
    pub async fn put(&self, url: &str, digest: &str) -> Result<()> {
        let url = canonical_url(url)?;
        let mut hashes = self.load().await?;
        if hashes.get(&url).is_some_and(|existing| existing == digest) {
            return Ok(());
        }
        let previous = hashes.insert(url, digest.to_string());
        self.save(&hashes).await?;
        tracing::info!(replaced = previous.is_some(), "Known hash recorded");
        Ok(())
    }

    /// Forget the digest for a URL.
    ///
    /// Returns `true` if an entry was removed. Deleting a URL that has no
    /// entry is a no-op, not an error; no other entry is touched.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete(&self, url: &str) -> Result<bool> {
        let url = canonical_url(url)?;
        let mut hashes = self.load().await?;
        if hashes.remove(&url).is_none() {
            tracing::debug!("No known hash to delete");
            return Ok(false);
        }
        self.save(&hashes).await?;
        tracing::info!("Known hash deleted");
        Ok(true)
    }

    /// Forget every known digest.
    pub async fn clear(&self) -> Result<usize> {
        let hashes = self.load().await?;
        if !hashes.is_empty() {
            self.save(&Hashes::new()).await?;
        }
        Ok(hashes.len())
    }
}
