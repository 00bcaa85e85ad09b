//! Core trait and types for node storage.

use bytes::Bytes;

/// Acknowledgement returned by [`NodeStore::put`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PutAck {
    /// Whether an existing value was overwritten.
    pub replaced: bool,
}

/// Trait for the key/value storage of one physical node.
///
/// Implementations must be `Send + Sync` so a cluster can serve requests
/// through shared references. Operations never fail: a write is an
/// unconditional upsert and a read reports absence as `None`.
/// Values are passed as [`Bytes`] so replicas share one allocation.
pub trait NodeStore: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: Bytes) -> PutAck;

    /// Retrieve the value for `key`. Returns `None` if not found.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Delete `key`. Returns whether it was present.
    fn delete(&self, key: &str) -> bool;

    /// Check whether `key` exists.
    fn contains(&self, key: &str) -> bool;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Whether the store holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// List all stored keys.
    fn keys(&self) -> Vec<String>;
}
