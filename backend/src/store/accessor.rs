//! Typed access to the session identity and weekly schedule.
//!
//! Absence of either key is a normal state (the user has not signed in or has
//! not synced a schedule yet). Read and decode failures are logged and
//! reported as absent so they surface through the sign-in/setup path instead
//! of stopping anything.

use log::error;
use serde::de::DeserializeOwned;
use std::sync::Arc;

use super::error::{ErrorContext, StoreError, StoreResult};
use super::repository::KeyValueStore;
use crate::api::{SessionSnapshot, WeeklySchedule, SCHEDULE_KEY, UID_KEY};

/// Reads and decodes the values the engine consumes.
#[derive(Clone)]
pub struct ScheduleStoreAccessor {
    store: Arc<dyn KeyValueStore>,
}

impl ScheduleStoreAccessor {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Read a JSON-encoded value. A stored JSON `null` reads as absent.
    pub async fn read_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let raw = self
            .store
            .get(key)
            .await
            .map_err(|e| e.at("get", key))?;

        match raw {
            None => Ok(None),
            Some(text) => serde_json::from_str::<Option<T>>(&text).map_err(|e| {
                StoreError::decode_with_context(
                    e.to_string(),
                    ErrorContext::new("decode").with_key(key),
                )
            }),
        }
    }

    /// Session identifier, or `None` when absent or unreadable.
    pub async fn uid(&self) -> Option<String> {
        self.read_or_absent(UID_KEY).await
    }

    /// Weekly schedule, or `None` when absent or unreadable.
    pub async fn schedule(&self) -> Option<WeeklySchedule> {
        self.read_or_absent(SCHEDULE_KEY).await
    }

    /// Read both values.
    pub async fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            uid: self.uid().await,
            schedule: self.schedule().await,
        }
    }

    async fn read_or_absent<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read_json(key).await {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to fetch '{}' from store: {}", key, e);
                None
            }
        }
    }
}
