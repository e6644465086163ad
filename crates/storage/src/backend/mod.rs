//! Option store trait and implementations.
//!
//! This module defines the `OptionStore` trait, which provides a unified
//! interface over wherever options are persisted (a directory of JSON files,
//! an in-memory map in tests, a read-only view for dry runs).
//!

mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod ro;

pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
pub use self::ro::ReadOnlyBackend;
use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Unified interface for option storage backends.
///
/// An option is a named JSON document. Callers load the whole document,
/// modify it, and write the whole document back; there is no partial update
/// and no locking between a `get` and the following `set` (last writer
/// wins). Each individual `set` must be atomic: readers see either the old
/// or the new document, never a torn one.
///
/// # Keys
/// All keys must be validated using [`validate_key`](crate::validate_key)
/// before use. Implementations should enforce this validation.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sri_storage::{OptionStore, error::Result};
///
/// async fn count_excluded(store: &dyn OptionStore) -> Result<usize> {
///     match store.get("wpsri_excluded_hashes").await? {
///         Some(serde_json::Value::Array(urls)) => Ok(urls.len()),
///         _ => Ok(0),
///     }
/// }
/// ```
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// Name of the configured backend (used for logging only).
    fn name(&self) -> &str;

    /// List the keys of all options currently stored, in no particular order.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Check if an option exists.
    ///
    /// Default implementation of this method calls [`get()`](Self::get) and
    /// discards the value.
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Read an option.
    ///
    /// Returns `Ok(None)` if the option has never been set (or was deleted);
    /// a missing option is not an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use sri_storage::{OptionStore, error::Result};
    /// # async fn example(store: &dyn OptionStore) -> Result<()> {
    /// if let Some(value) = store.get("wpsri_known_hashes").await? {
    ///     println!("{value}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write an option.
    ///
    /// Creates the option or replaces its previous value entirely.
    ///
    /// ```no_run
    /// use serde_json::json;
    /// # use sri_storage::{OptionStore, error::Result};
    /// # async fn example(store: &dyn OptionStore) -> Result<()> {
    /// store.set("wpsri_excluded_hashes", &json!(["https://cdn.example.com/lib.js"])).await?;
    /// # Ok(())
    /// # }
    /// ```
    async fn set(&self, key: &str, value: &Value) -> Result<()>;

    /// Delete an option.
    ///
    /// Returns `true` if the option existed. Deleting an option that doesn't
    /// exist is a no-op, not an error.
    async fn delete(&self, key: &str) -> Result<bool>;
}
