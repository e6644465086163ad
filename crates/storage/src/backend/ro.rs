//! Read-only option store.
//!
//! This module provides an option store implementation that wraps other
//! implementations and prevents write operations from executing, but
//! indicating success on return.

use async_trait::async_trait;
use serde_json::Value;

use crate::{OptionStore, StoreHandle, error::Result};

/// Read-only option store.
///
/// Wraps another store and silently drops all write operations, logging an
/// [`info event`](tracing::Event). Used for dry runs: every caller behaves
/// exactly as it would, without persisting anything.
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: StoreHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl OptionStore for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys().await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, _value: &Value) -> Result<()> {
        tracing::info!(store = self.name(), key, "Skipping option write during read-only mode");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        tracing::info!(store = self.name(), key, "Skipping option delete during read-only mode");
        Ok(false)
    }
}
