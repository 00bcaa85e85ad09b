//! Error types for the cluster crate.

use reef_placement::PlacementError;
use reef_types::NodeId;

/// Errors produced by cluster operations.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// A ring membership change was rejected.
    #[error("placement error: {0}")]
    Placement(#[from] PlacementError),

    /// No nodes are deployed, so the key has no owner.
    #[error("no capacity: no nodes are deployed")]
    NoCapacity,

    /// Requests must target at least one replica.
    #[error("invalid replication factor {0}: must be at least 1")]
    InvalidReplicationFactor(usize),

    /// The ring routed to a node that has no store.
    ///
    /// Ring membership and the store map are updated together, so this
    /// indicates a broken invariant rather than a normal failure.
    #[error("node {0} is on the ring but has no store")]
    MissingStore(NodeId),

    /// The configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// Reading a config file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
