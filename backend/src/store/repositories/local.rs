//! In-memory local store implementation.
//!
//! Data lives in a HashMap behind a lock. Health can be toggled to simulate
//! read failures.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::store::error::{ErrorContext, StoreError, StoreResult};
use crate::store::repository::KeyValueStore;

/// In-memory key-value store.
///
/// Clones share the same underlying data, so a test can keep one handle to
/// write "out of band" while the engine polls another.
///
/// # Example
/// ```ignore
/// use classroute::store::{KeyValueStore, LocalStore};
///
/// let store = LocalStore::new();
/// store.insert("uid", "\"user-1\"");
/// assert_eq!(store.get("uid").await?.as_deref(), Some("\"user-1\""));
/// ```
#[derive(Clone)]
pub struct LocalStore {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    values: HashMap<String, String>,
    is_healthy: bool,
}

impl LocalStore {
    /// Create a new empty local store.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData {
                values: HashMap::new(),
                is_healthy: true,
            })),
        }
    }

    /// Insert a raw value synchronously.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.data.write().values.insert(key.into(), value.into());
    }

    /// Insert a value after JSON-encoding it.
    pub fn insert_json<T: serde::Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| StoreError::internal(e.to_string()).at("insert_json", key))?;
        self.insert(key, encoded);
        Ok(())
    }

    /// Remove a value synchronously.
    pub fn delete(&self, key: &str) {
        self.data.write().values.remove(key);
    }

    /// Set the health status for testing read failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the store.
    pub fn clear(&self) {
        self.data.write().values.clear();
    }

    /// Number of keys stored.
    pub fn len(&self) -> usize {
        self.data.read().values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_health(&self, operation: &str, key: &str) -> StoreResult<()> {
        if !self.data.read().is_healthy {
            return Err(StoreError::read_with_context(
                "Store is not healthy",
                ErrorContext::new(operation).with_key(key),
            ));
        }
        Ok(())
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for LocalStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_health("get", key)?;
        Ok(self.data.read().values.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_health("set", key)?;
        self.insert(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.check_health("remove", key)?;
        self.delete(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_absent_key() {
        let store = LocalStore::new();
        assert_eq!(store.get("uid").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = LocalStore::new();
        store.set("uid", "\"abc\"").await.unwrap();
        assert_eq!(store.get("uid").await.unwrap().as_deref(), Some("\"abc\""));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = LocalStore::new();
        let writer = store.clone();
        writer.insert("Schedule", "[]");
        assert!(store.get("Schedule").await.unwrap().is_some());

        writer.clear();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_unhealthy_store_fails_reads() {
        let store = LocalStore::new();
        store.insert("uid", "\"abc\"");
        store.set_healthy(false);

        let err = store.get("uid").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(err.context().key.as_deref(), Some("uid"));

        store.set_healthy(true);
        assert!(store.get("uid").await.unwrap().is_some());
    }
}
