//! Cluster management on top of the placement ring.
//!
//! This crate provides:
//!
//! - [`ClusterManager`] owns the ring and one store per deployed node,
//!   and routes reads and writes to a key's replicas.
//! - [`ClusterConfig`]: TOML configuration for ring, replication and the
//!   initial node list.

mod config;
mod error;
mod manager;


pub use config::{ClusterConfig, NodeSpec, ReplicationSection, RingSection};
pub use error::ClusterError;
pub use manager::{ClusterManager, ReadHit, ReadOutcome, Response, WriteAck};
