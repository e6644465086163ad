use exn::ResultExt;
use sri_cache::{ExcludedUrls, KnownHashes, Prefix};
use sri_config::Config;
use sri_nonce::Nonces;
use sri_resource::Origin;
use sri_storage::StoreHandle;
use sri_storage::backend::{LocalBackend, ReadOnlyBackend};
use std::sync::Arc;

use crate::error::{ErrorKind, Result};

/// Everything a command needs, built once from the configuration.
pub struct Context {
    pub config: Config,
    pub store: StoreHandle,
    pub prefix: Prefix,
}
impl Context {
    /// Open the configured option directory.
    pub fn open(config: Config) -> Result<Self> {
        let path = config.storage_path().or_raise(|| ErrorKind::Config)?;
        let local: StoreHandle = Arc::new(LocalBackend::new("local", &path).or_raise(|| ErrorKind::Storage)?);
        let store: StoreHandle = if config.storage.read_only {
            tracing::info!(path = %path.display(), "Option storage is read-only");
            Arc::new(ReadOnlyBackend::new(local))
        } else {
            local
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: StoreHandle) -> Result<Self> {
        let prefix = config.prefix().or_raise(|| ErrorKind::Config)?;
        Ok(Self { config, store, prefix })
    }

    pub fn origin(&self) -> Result<Origin> {
        self.config.origin().or_raise(|| ErrorKind::Config)
    }

    pub fn known(&self) -> KnownHashes {
        KnownHashes::new(self.store.clone(), &self.prefix)
    }

    pub fn excluded(&self) -> ExcludedUrls {
        ExcludedUrls::new(self.store.clone(), &self.prefix)
    }

    pub fn nonces(&self) -> Result<Nonces> {
        let secret = self.config.nonce_secret().or_raise(|| ErrorKind::Config)?;
        let nonces = Nonces::new(secret, self.store.clone(), &self.prefix).or_raise(|| ErrorKind::Nonce)?;
        Ok(nonces.with_lifetime(self.config.nonce.lifetime()))
    }
}
