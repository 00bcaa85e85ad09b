//! Weighted consistent hashing ring for deterministic key placement.
//!
//! This crate implements a consistent hash ring that maps keys to physical
//! node IDs. Nodes carry a capacity weight, and the ring supports computing
//! which keys must migrate when membership changes.
//!
//! The ring uses virtual nodes (vnodes): each physical node gets
//! `round(base_vnodes * weight)` positions on the ring, determined by hashing
//! the placement label `"{node_id}#{index}"` with a pluggable
//! [`RingHasher`]. More vnodes per node = more uniform distribution.

mod error;
pub mod hash;
mod ring;

pub use error::PlacementError;
pub use hash::{Blake3Hasher, HasherKind, RingHasher, XxHasher};
pub use ring::{
    DEFAULT_BASE_VNODES, MAX_COLLISION_RETRIES, MAX_VNODES_PER_NODE, Migration, NodeInfo,
    Placement, Ring,
};
