//! TOML configuration for a Reef cluster.
//!
//! Every section is optional; omitted values fall back to the defaults
//! documented on each field.

use std::path::Path;

use reef_placement::{DEFAULT_BASE_VNODES, HasherKind};
use reef_types::NodeId;
use serde::{Deserialize, Serialize};

use crate::error::ClusterError;

/// Top-level cluster configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Ring construction parameters.
    pub ring: RingSection,
    /// Replication policy.
    pub replication: ReplicationSection,
    /// Nodes deployed when the cluster is built.
    pub nodes: Vec<NodeSpec>,
}

/// `[ring]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// Vnodes for a node of weight 1. Defaults to 100.
    pub base_vnodes: u32,
    /// Hash function: `"xxhash"` (default) or `"blake3"`.
    pub hasher: HasherKind,
}

impl Default for RingSection {
    fn default() -> Self {
        Self {
            base_vnodes: DEFAULT_BASE_VNODES,
            hasher: HasherKind::default(),
        }
    }
}

/// `[replication]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicationSection {
    /// Number of distinct nodes each key is written to. Defaults to 2.
    pub factor: usize,
}

impl Default for ReplicationSection {
    fn default() -> Self {
        Self { factor: 2 }
    }
}

/// One `[[nodes]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Node identifier.
    pub id: NodeId,
    /// Capacity weight. Defaults to 1.0.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

fn default_weight() -> f64 {
    1.0
}

impl ClusterConfig {
    /// Load and validate config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ClusterError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ClusterError> {
        let config: ClusterConfig =
            toml::from_str(s).map_err(|e| ClusterError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot.
    ///
    /// Node weights and duplicate IDs are checked by the ring when the
    /// nodes are deployed.
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.ring.base_vnodes == 0 {
            return Err(ClusterError::Config(
                "ring.base_vnodes must be at least 1".to_string(),
            ));
        }
        if self.replication.factor == 0 {
            return Err(ClusterError::Config(
                "replication.factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
