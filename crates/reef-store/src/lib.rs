//! Node-local key/value storage.
//!
//! This crate defines the [`NodeStore`] trait that the cluster manager
//! routes reads and writes to, along with the in-memory backend
//! [`MemoryStore`] used for every simulated physical node.
//!
//! Stores are independent: there is no coordination between nodes, and
//! replication is entirely a routing decision made above this layer.

mod memory_store;
mod traits;

pub use memory_store::MemoryStore;
pub use traits::{NodeStore, PutAck};
