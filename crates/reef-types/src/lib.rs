//! Shared types and identifiers for Reef.
//!
//! This crate defines the types used across the Reef workspace: the
//! physical node identifier ([`NodeId`]), the membership state machine
//! ([`MembershipState`]) and the membership events ([`ClusterEvent`]) emitted
//! when nodes are deployed or fail.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ID types
// ---------------------------------------------------------------------------

/// Identifier for a physical node.
///
/// Node IDs are free-form strings chosen by the operator (`"node-a"`,
/// `"10.0.0.7:4820"`, ...). Ordering is lexicographic, which keeps listings
/// and test output stable.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node ID from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl AsRef<[u8]> for NodeId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cluster types
// ---------------------------------------------------------------------------

/// Membership state of a ring or cluster.
///
/// Deploying a node moves `Empty` to `Populated` (or stays `Populated`).
/// Removing a node stays `Populated` until the last member leaves, which
/// moves back to `Empty`. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipState {
    /// No physical nodes are present.
    Empty,
    /// At least one physical node is present.
    Populated,
}

impl MembershipState {
    /// Derive the state from a member count.
    pub fn from_count(members: usize) -> Self {
        if members == 0 {
            Self::Empty
        } else {
            Self::Populated
        }
    }
}

/// Membership events recorded by the cluster manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClusterEvent {
    /// A node was deployed with the given weight and vnode count.
    NodeDeployed {
        /// The deployed node.
        node: NodeId,
        /// Capacity weight relative to a unit node.
        weight: f64,
        /// Number of virtual nodes placed on the ring.
        vnodes: usize,
    },
    /// A node failed; its stored data is gone.
    NodeFailed {
        /// The failed node.
        node: NodeId,
        /// Number of keys that were held by the node's store.
        keys_lost: usize,
    },
}
