//! Cluster manager: ring membership plus replica-aware request routing.
//!
//! [`ClusterManager`] owns the placement ring and one [`NodeStore`] per
//! deployed node. Membership changes (`deploy`, `fail`) take `&mut self`;
//! data-plane requests take `&self`, so any number of readers and writers
//! of key/value data can share a manager while the borrow checker keeps
//! membership changes exclusive.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use reef_placement::{HasherKind, Ring, RingHasher};
use reef_store::{MemoryStore, NodeStore};
use reef_types::{ClusterEvent, MembershipState, NodeId};
use tracing::{debug, error, info, warn};

use crate::config::ClusterConfig;
use crate::error::ClusterError;

/// Acknowledgement from one replica of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    /// Replica that stored the value.
    pub node: NodeId,
    /// Whether the replica already held a value for the key.
    pub replaced: bool,
}

/// A successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadHit {
    /// Replica that served the value.
    pub node: NodeId,
    /// The stored value.
    pub value: Bytes,
}

/// Result of a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The first replica in ring order that held the key.
    Found(ReadHit),
    /// No replica held the key.
    ///
    /// This cannot be told apart from a key that was never written.
    Unavailable {
        /// Replicas asked, in ring order.
        replicas_tried: Vec<NodeId>,
    },
}

/// Result of [`ClusterManager::request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// A write, acknowledged by every replica in ring order.
    Written(Vec<WriteAck>),
    /// A read.
    Read(ReadOutcome),
}

/// Composes the placement ring with the stores of the deployed nodes.
pub struct ClusterManager<H = HasherKind> {
    ring: Ring<H>,
    stores: HashMap<NodeId, Arc<dyn NodeStore>>,
    replication_factor: usize,
    events: Vec<ClusterEvent>,
}

impl ClusterManager<HasherKind> {
    /// Build a cluster from config and deploy its initial nodes.
    pub fn from_config(config: &ClusterConfig) -> Result<Self, ClusterError> {
        config.validate()?;
        let mut cluster = Self::with_hasher(
            config.ring.base_vnodes,
            config.replication.factor,
            config.ring.hasher,
        );
        for node in &config.nodes {
            cluster.deploy(node.id.clone(), node.weight)?;
        }
        Ok(cluster)
    }

    /// Create an empty cluster hashing with xxHash64.
    ///
    /// `replication_factor` is the default for [`write`](Self::write) and
    /// [`read`](Self::read); 0 is raised to 1. An explicit factor of 0
    /// passed to [`request`](Self::request) is still rejected. A
    /// `base_vnodes` of 0 is raised to 1.
    pub fn new(base_vnodes: u32, replication_factor: usize) -> Self {
        Self::with_hasher(base_vnodes, replication_factor, HasherKind::Xxhash)
    }
}

impl<H: RingHasher> ClusterManager<H> {
    /// Create an empty cluster with a custom hash function.
    ///
    /// Zero `base_vnodes` and `replication_factor` are raised to 1, as in
    /// [`ClusterManager::new`].
    pub fn with_hasher(base_vnodes: u32, replication_factor: usize, hasher: H) -> Self {
        Self {
            ring: Ring::with_hasher(base_vnodes, hasher),
            stores: HashMap::new(),
            replication_factor: replication_factor.max(1),
            events: Vec::new(),
        }
    }

    /// Deploy a node backed by a fresh [`MemoryStore`].
    pub fn deploy(
        &mut self,
        node_id: impl Into<NodeId>,
        weight: f64,
    ) -> Result<(), ClusterError> {
        let node_id = node_id.into();
        let store = Arc::new(MemoryStore::new(node_id.as_str()));
        self.deploy_with_store(node_id, weight, store)
    }

    /// Deploy a node backed by the given store.
    ///
    /// The store is only kept if the ring accepts the node.
    pub fn deploy_with_store(
        &mut self,
        node_id: impl Into<NodeId>,
        weight: f64,
        store: Arc<dyn NodeStore>,
    ) -> Result<(), ClusterError> {
        let node_id = node_id.into();
        self.ring.add_node(node_id.clone(), weight)?;
        let vnodes = self
            .ring
            .node_info(node_id.as_str())
            .map_or(0, |info| info.vnode_count());

        self.stores.insert(node_id.clone(), store);
        info!(%node_id, weight, vnodes, "node deployed");
        self.events.push(ClusterEvent::NodeDeployed {
            node: node_id,
            weight,
            vnodes,
        });
        Ok(())
    }

    /// Fail a node: drop its store and remove it from the ring.
    ///
    /// Data held by the node is lost. Nothing is migrated; keys it owned are
    /// served by their next clockwise replica from now on.
    pub fn fail(&mut self, node_id: &str) -> Result<(), ClusterError> {
        self.ring.remove_node(node_id)?;
        let keys_lost = self.stores.remove(node_id).map_or(0, |store| store.len());

        info!(%node_id, keys_lost, "node failed");
        self.events.push(ClusterEvent::NodeFailed {
            node: NodeId::from(node_id),
            keys_lost,
        });
        Ok(())
    }

    /// Serve a request for `key` across `replication_factor` replicas.
    ///
    /// With a value this is a write to every replica; without one it is a
    /// read that returns the first replica holding the key.
    pub fn request(
        &self,
        key: &str,
        value: Option<Bytes>,
        replication_factor: usize,
    ) -> Result<Response, ClusterError> {
        match value {
            Some(value) => self
                .write_with(key, value, replication_factor)
                .map(Response::Written),
            None => self.read_with(key, replication_factor).map(Response::Read),
        }
    }

    /// Write `key` to the configured number of replicas.
    pub fn write(&self, key: &str, value: Bytes) -> Result<Vec<WriteAck>, ClusterError> {
        self.write_with(key, value, self.replication_factor)
    }

    /// Read `key` from the configured number of replicas.
    pub fn read(&self, key: &str) -> Result<ReadOutcome, ClusterError> {
        self.read_with(key, self.replication_factor)
    }

    /// Write `key` to `replication_factor` replicas.
    pub fn write_with(
        &self,
        key: &str,
        value: Bytes,
        replication_factor: usize,
    ) -> Result<Vec<WriteAck>, ClusterError> {
        let targets = self.resolve(key, replication_factor)?;
        debug!(key, replicas = ?targets, "routing write");

        let mut acks = Vec::with_capacity(targets.len());
        for node in targets {
            let ack = self.store_for(&node)?.put(key, value.clone());
            acks.push(WriteAck {
                node,
                replaced: ack.replaced,
            });
        }
        Ok(acks)
    }

    /// Read `key` from up to `replication_factor` replicas in ring order.
    pub fn read_with(
        &self,
        key: &str,
        replication_factor: usize,
    ) -> Result<ReadOutcome, ClusterError> {
        let targets = self.resolve(key, replication_factor)?;

        for node in &targets {
            if let Some(value) = self.store_for(node)?.get(key) {
                debug!(key, %node, "read served");
                return Ok(ReadOutcome::Found(ReadHit {
                    node: node.clone(),
                    value,
                }));
            }
        }

        warn!(key, replicas = targets.len(), "key unavailable on all replicas");
        Ok(ReadOutcome::Unavailable {
            replicas_tried: targets,
        })
    }

    /// Replica owners for `key` under the configured replication factor.
    pub fn owners(&self, key: &str) -> Vec<NodeId> {
        self.ring.replicas(key, self.replication_factor)
    }

    /// Primary owner for `key`, or `None` when no nodes are deployed.
    pub fn primary(&self, key: &str) -> Option<NodeId> {
        self.ring.node_for(key)
    }

    /// Read-only view of the placement ring.
    pub fn ring(&self) -> &Ring<H> {
        &self.ring
    }

    /// Store of a deployed node.
    pub fn store(&self, node_id: &str) -> Option<Arc<dyn NodeStore>> {
        self.stores.get(node_id).cloned()
    }

    /// Deployed node IDs, sorted.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.ring.node_ids()
    }

    /// Number of deployed nodes.
    pub fn node_count(&self) -> usize {
        self.ring.node_count()
    }

    /// Current membership state.
    pub fn state(&self) -> MembershipState {
        self.ring.membership_state()
    }

    /// Configured replication factor.
    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// Take the membership events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<ClusterEvent> {
        std::mem::take(&mut self.events)
    }

    fn resolve(
        &self,
        key: &str,
        replication_factor: usize,
    ) -> Result<Vec<NodeId>, ClusterError> {
        if replication_factor == 0 {
            return Err(ClusterError::InvalidReplicationFactor(replication_factor));
        }
        let targets = self.ring.replicas(key, replication_factor);
        if targets.is_empty() {
            return Err(ClusterError::NoCapacity);
        }
        Ok(targets)
    }

    /// Drop a node's store while leaving it on the ring.
    #[cfg(test)]
    pub(crate) fn detach_store(&mut self, node_id: &str) -> Option<Arc<dyn NodeStore>> {
        self.stores.remove(node_id)
    }

    fn store_for(&self, node_id: &NodeId) -> Result<&Arc<dyn NodeStore>, ClusterError> {
        self.stores.get(node_id).ok_or_else(|| {
            error!(%node_id, "ring routed to a node without a store");
            ClusterError::MissingStore(node_id.clone())
        })
    }
}

impl<H> std::fmt::Debug for ClusterManager<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterManager")
            .field("nodes", &self.stores.len())
            .field("replication_factor", &self.replication_factor)
            .finish_non_exhaustive()
    }
}
