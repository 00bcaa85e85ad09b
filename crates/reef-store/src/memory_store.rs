//! In-memory node storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::traits::{NodeStore, PutAck};

/// In-memory key/value store backed by a `RwLock<HashMap>`.
///
/// Each simulated physical node owns one. Dropping the store drops its
/// data, which is how a node failure loses everything it held.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    entries: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store labelled with the owning node's name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Name of the node this store belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl NodeStore for MemoryStore {
    fn put(&self, key: &str, value: Bytes) -> PutAck {
        let mut map = self.entries.write().expect("lock poisoned");
        debug!(node = %self.name, key, size = value.len(), "storing value in memory");
        let replaced = map.insert(key.to_string(), value).is_some();
        PutAck { replaced }
    }

    fn get(&self, key: &str) -> Option<Bytes> {
        let map = self.entries.read().expect("lock poisoned");
        map.get(key).cloned()
    }

    fn delete(&self, key: &str) -> bool {
        let mut map = self.entries.write().expect("lock poisoned");
        let removed = map.remove(key).is_some();
        if removed {
            debug!(node = %self.name, key, "deleted value from memory");
        }
        removed
    }

    fn contains(&self, key: &str) -> bool {
        let map = self.entries.read().expect("lock poisoned");
        map.contains_key(key)
    }

    fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    fn keys(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        map.keys().cloned().collect()
    }
}
