//! In-memory option store for testing.

use crate::backend::OptionStore;
use crate::error::Result;
use crate::key::validate as validate_key;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory option store for testing.
///
/// Options are stored in a `HashMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation. Ideal
/// for unit tests that need an [`OptionStore`] without filesystem
/// dependencies.
pub struct MockBackend {
    name: String,
    storage: RwLock<HashMap<String, Value>>,
}

impl MockBackend {
    /// Create a mock store pre-populated with options.
    ///
    /// Panics if any key fails validation. If test setup is wrong, then test
    /// should not pass.
    pub fn with_options(options: impl IntoIterator<Item = (impl Into<String>, Value)>) -> Self {
        let mut map = HashMap::new();
        for (key, value) in options {
            let key = key.into();
            if validate_key(&key).is_err() {
                panic!("MockBackend::with_options: invalid key {key:?}");
            }
            map.insert(key, value);
        }
        Self {
            name: "mock".to_string(),
            storage: RwLock::new(map),
        }
    }

    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        let options: [(&str, Value); 0] = [];
        Self::with_options(options)
    }
}

#[async_trait]
impl OptionStore for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.storage.read().await.keys().cloned().collect())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let key = validate_key(key)?;
        Ok(self.storage.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let key = validate_key(key)?;
        self.storage.write().await.insert(key.to_string(), value.clone());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let key = validate_key(key)?;
        Ok(self.storage.write().await.remove(key).is_some())
    }
}
