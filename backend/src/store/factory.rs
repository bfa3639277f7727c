//! Store factory for dependency injection.
//!
//! Creates store instances from runtime configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::error::{StoreError, StoreResult};
use super::repositories::{FileStore, LocalStore};
use super::repository::KeyValueStore;
use crate::config::StoreSettings;

/// Store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// One JSON file per key in a directory
    File,
    /// In-memory store
    Local,
}

impl FromStr for StoreType {
    type Err = String;

    /// Parse store type from string ("file", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "fs" => Ok(Self::File),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown store type: {}", s)),
        }
    }
}

/// Store factory.
pub struct StoreFactory;

impl StoreFactory {
    /// Create an in-memory local store.
    pub fn create_local() -> Arc<dyn KeyValueStore> {
        Arc::new(LocalStore::new())
    }

    /// Create a store from configuration.
    ///
    /// # Returns
    /// * `Ok(Arc<dyn KeyValueStore>)` - Store instance
    /// * `Err(StoreError)` - If the type is unknown or the directory cannot be created
    pub fn from_settings(settings: &StoreSettings) -> StoreResult<Arc<dyn KeyValueStore>> {
        let store_type = StoreType::from_str(&settings.store_type)
            .map_err(StoreError::configuration)?;

        match store_type {
            StoreType::Local => Ok(Self::create_local()),
            StoreType::File => {
                let store = FileStore::open(&settings.path)?;
                Ok(Arc::new(store))
            }
        }
    }
}
