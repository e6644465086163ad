//! Option storage for sri.
//!
//! Everything sri persists (known hashes, excluded URLs, consumed nonces)
//! lives in a handful of named options, each holding one JSON document. The
//! [`OptionStore`] trait is the only way the rest of the workspace touches
//! persistent state; backends are injected as a [`StoreHandle`].

pub mod backend;
pub mod error;
mod key;

pub use crate::backend::OptionStore;
pub use crate::key::validate as validate_key;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn OptionStore + Send + Sync>;

/// Load an option and deserialize it into `T`.
///
/// Returns `Ok(None)` when the option has never been set. An option that
/// exists but doesn't have the expected shape is
/// [`InvalidData`](ErrorKind::InvalidData).
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// # use sri_storage::{OptionStore, error::Result};
/// # async fn example(store: &dyn OptionStore) -> Result<()> {
/// let hashes: BTreeMap<String, String> = sri_storage::load(store, "wpsri_known_hashes").await?.unwrap_or_default();
/// # Ok(())
/// # }
/// ```
pub async fn load<T: DeserializeOwned>(store: &dyn OptionStore, key: &str) -> Result<Option<T>> {
    let Some(value) = store.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_value(value).or_raise(|| ErrorKind::InvalidData(key.to_string())).map(Some)
}

/// Serialize `value` and store it under `key`, replacing any previous value.
pub async fn save<T: Serialize + ?Sized>(store: &dyn OptionStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value).or_raise(|| ErrorKind::InvalidData(key.to_string()))?;
    store.set(key, &value).await
}
