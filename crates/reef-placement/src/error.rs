//! Error types for ring membership changes.

use reef_types::NodeId;

/// Errors produced by ring membership operations.
///
/// Lookups never fail: an empty ring yields `None` or an empty replica set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlacementError {
    /// The node is already on the ring.
    #[error("node already deployed: {0}")]
    DuplicateNode(NodeId),

    /// The node is not on the ring.
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Weights must be finite and strictly positive.
    #[error("invalid weight {weight} for node {node}: must be finite and > 0")]
    InvalidWeight {
        /// Node being added.
        node: NodeId,
        /// The rejected weight.
        weight: f64,
    },

    /// The weight asks for more vnodes than one node may own.
    #[error("node {node} would need {requested} vnodes, more than the limit of {max}")]
    TooManyVnodes {
        /// Node being added.
        node: NodeId,
        /// `round(base_vnodes * weight)`, before the cast to an integer.
        requested: f64,
        /// The per-node limit.
        max: usize,
    },

    /// Every salted placement label for a vnode collided with an occupied
    /// position. The node is not added.
    #[error("vnode {vnode_index} of node {node} still collides after {attempts} salted rehashes")]
    CollisionRetriesExhausted {
        /// Node being added.
        node: NodeId,
        /// Index of the vnode that could not be placed.
        vnode_index: usize,
        /// Number of salted attempts made.
        attempts: u32,
    },
}
