//! Store trait definitions

use crate::StoreResult;

/// Synchronous string-keyed storage medium.
///
/// Writes to a single key are atomic; nothing spans keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// All stored keys, sorted
    fn keys(&self) -> StoreResult<Vec<String>>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
