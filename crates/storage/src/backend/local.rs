//! Local filesystem option store.
//!
//! Each option is stored as a JSON document named `<key>.json` inside a
//! configured directory, accessed via `tokio::fs` for async I/O.

use crate::error::{ErrorKind, Result};
use crate::key::validate as validate_key;
use crate::OptionStore;
use async_trait::async_trait;
use exn::ResultExt;
use serde_json::Value;
use std::fs::create_dir_all as sync_create_dir;
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

/// Local filesystem option store.
///
/// # Examples
///
/// ```no_run
/// use sri_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalBackend::new("local", "/var/lib/sri/options")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    /// Directory holding one JSON file per option.
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem store.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, exists but isn't a
    /// directory, or can't be created.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::BackendError(format!("storage root must be absolute: {}", root.display())));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::BackendError(format!("storage root is not a directory: {}", root.display())));
            }
        } else {
            // Use non-async here; it'll only happen once on startup and it's
            // not worth the hassle of making the constructor async.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    fn option_path(&self, key: &str) -> Result<PathBuf> {
        let key = validate_key(key)?;
        Ok(self.root.join(format!("{key}.{EXTENSION}")))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }
}

#[async_trait]
impl OptionStore for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| Self::map_io_error(e, &self.root))?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| Self::map_io_error(e, &self.root))? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            // Note: silently skip anything that couldn't have been written by
            // this backend (temporary files, hand-made files with odd names).
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                && validate_key(stem).is_ok()
            {
                keys.push(stem.to_string());
            }
        }
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.option_path(key)?;
        fs::try_exists(&path).await.map_err(|e| Self::map_io_error(e, &path).into())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.option_path(key)?;
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => exn::bail!(Self::map_io_error(e, &path)),
        };
        let value = serde_json::from_slice(&bytes).or_raise(|| ErrorKind::InvalidData(key.to_string()))?;
        Ok(Some(value))
    }

    async fn set(&self, key: &str, value: &Value) -> Result<()> {
        let path = self.option_path(key)?;
        let bytes = serde_json::to_vec_pretty(value).or_raise(|| ErrorKind::InvalidData(key.to_string()))?;
        // Write next to the target then rename over it, so that readers never
        // observe a half-written document. Every write gets its own temporary
        // file; the leading dot and suffix keep it out of `keys()`, and it is
        // removed on drop unless persisted.
        let tmp = tempfile::Builder::new()
            .prefix(&format!(".{key}."))
            .suffix(&format!(".{EXTENSION}.tmp"))
            .tempfile_in(&self.root)
            .map_err(|e| Self::map_io_error(e, &self.root))?
            .into_temp_path();
        fs::write(&tmp, &bytes).await.map_err(|e| Self::map_io_error(e, &tmp))?;
        tmp.persist(&path).map_err(|e| Self::map_io_error(e.error, &path))?;
        tracing::trace!(store = %self.name, key, bytes = bytes.len(), "Option written");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.option_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => exn::bail!(Self::map_io_error(e, &path)),
        }
    }
}
