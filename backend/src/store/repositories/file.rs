//! Directory-backed store implementation.
//!
//! Each key maps to `<root>/<key>.json`. A missing file is an absent key.
//! Writes go through a temporary file and a rename so a concurrent poll never
//! reads a half-written value.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::store::error::{ErrorContext, StoreError, StoreResult};
use crate::store::repository::KeyValueStore;

/// Key-value store persisted as one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open<P: AsRef<Path>>(root: P) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root).map_err(|e| {
            StoreError::Configuration {
                message: format!("Failed to create store directory: {}", e),
                context: ErrorContext::new("open").with_details(root.display().to_string()),
            }
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, operation: &str, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::Configuration {
                message: "Invalid store key".to_string(),
                context: ErrorContext::new(operation).with_key(key),
            });
        }
        Ok(self.root.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for("get", key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::read_with_context(
                e.to_string(),
                ErrorContext::new("get")
                    .with_key(key)
                    .with_details(path.display().to_string()),
            )),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for("set", key)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value)
            .await
            .map_err(|e| StoreError::from(e).at("set", key))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| StoreError::from(e).at("set", key))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for("remove", key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::from(e).at("remove", key)),
        }
    }
}
