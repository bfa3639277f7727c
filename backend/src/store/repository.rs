//! Key-value store trait.

use async_trait::async_trait;

use super::error::StoreResult;

/// Persistent key-value store holding JSON-encoded values.
///
/// The engine only ever reads; `set` and `remove` exist for out-of-band
/// writers (sign-in, schedule sync) and for seeding tests.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw stored text for a key.
    ///
    /// # Returns
    /// * `Ok(Some(String))` - The stored value
    /// * `Ok(None)` - The key is absent
    /// * `Err(StoreError)` - If the read fails
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store raw text under a key, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}
