//! Consistent hashing ring implementation.

use std::collections::{BTreeMap, HashMap, HashSet};

use reef_types::{MembershipState, NodeId};
use tracing::{debug, warn};

use crate::error::PlacementError;
use crate::hash::{RingHasher, XxHasher};

/// Base number of vnodes for a node of weight 1.
pub const DEFAULT_BASE_VNODES: u32 = 100;

/// Maximum number of salted rehashes tried for a single colliding vnode.
pub const MAX_COLLISION_RETRIES: u32 = 16;

/// Upper bound on the vnodes a single node may own.
pub const MAX_VNODES_PER_NODE: usize = 1 << 20;

/// A single vnode placement: the label that was hashed and where it landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Placement label, `"{node}#{index}"` or `"{node}#{index}~{salt}"` when
    /// the unsalted label collided.
    pub label: String,
    /// Position on the ring.
    pub position: u64,
}

/// Metadata about a node on the ring.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    /// Capacity weight relative to a unit node.
    pub weight: f64,
    /// Vnode placements actually used, in vnode index order.
    pub placements: Vec<Placement>,
}

impl NodeInfo {
    /// Number of vnodes this node owns.
    pub fn vnode_count(&self) -> usize {
        self.placements.len()
    }
}

/// A key migration from one node to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// The key that must move.
    pub key: String,
    /// The node that currently owns it.
    pub from: NodeId,
    /// The node that should own it after the change.
    pub to: NodeId,
}

/// Weighted consistent hashing ring for deterministic key placement.
///
/// Each node is mapped to `round(base_vnodes * weight)` virtual nodes on a
/// `u64` ring. Key placement is determined by walking clockwise from the
/// key's position until enough distinct physical nodes are found.
#[derive(Debug, Clone)]
pub struct Ring<H = XxHasher> {
    /// Virtual node positions: ring position -> physical node.
    vnodes: BTreeMap<u64, NodeId>,
    /// Per-node metadata.
    nodes: HashMap<NodeId, NodeInfo>,
    /// Base number of vnodes per unit of weight.
    base_vnodes: u32,
    hasher: H,
}

impl Ring<XxHasher> {
    /// Create a new empty ring hashing with xxHash64.
    ///
    /// `base_vnodes` is the vnode count for a node with weight 1. A value of
    /// 0 is raised to 1.
    pub fn new(base_vnodes: u32) -> Self {
        Self::with_hasher(base_vnodes, XxHasher)
    }
}

impl Default for Ring<XxHasher> {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_VNODES)
    }
}

impl<H: RingHasher> Ring<H> {
    /// Create a new empty ring with a custom hash function.
    ///
    /// As with [`Ring::new`], a `base_vnodes` of 0 is raised to 1.
    pub fn with_hasher(base_vnodes: u32, hasher: H) -> Self {
        Self {
            vnodes: BTreeMap::new(),
            nodes: HashMap::new(),
            base_vnodes: base_vnodes.max(1),
            hasher,
        }
    }

    /// Add a node to the ring with the given capacity weight.
    ///
    /// The node gets `round(base_vnodes * weight)` vnodes (at least one, at
    /// most [`MAX_VNODES_PER_NODE`]). All positions are computed before the ring is touched, so on error
    /// the ring is unchanged.
    pub fn add_node(
        &mut self,
        node_id: impl Into<NodeId>,
        weight: f64,
    ) -> Result<(), PlacementError> {
        let node_id = node_id.into();
        if !weight.is_finite() || weight <= 0.0 {
            return Err(PlacementError::InvalidWeight {
                node: node_id,
                weight,
            });
        }
        if self.nodes.contains_key(&node_id) {
            return Err(PlacementError::DuplicateNode(node_id));
        }

        let count = self.vnode_count_for(&node_id, weight)?;
        let mut placements = Vec::with_capacity(count);
        let mut claimed = HashSet::with_capacity(count);
        for index in 0..count {
            let placement = self.place_vnode(&node_id, index, &claimed)?;
            claimed.insert(placement.position);
            placements.push(placement);
        }

        for placement in &placements {
            self.vnodes.insert(placement.position, node_id.clone());
        }
        debug!(%node_id, weight, vnodes = count, "added node to ring");
        self.nodes.insert(node_id, NodeInfo { weight, placements });
        Ok(())
    }

    /// Remove a node and all of its vnodes from the ring.
    ///
    /// Removes exactly the positions recorded when the node was added,
    /// including salted ones. Returns the removed node's metadata.
    pub fn remove_node(&mut self, node_id: &str) -> Result<NodeInfo, PlacementError> {
        let info = self
            .nodes
            .remove(node_id)
            .ok_or_else(|| PlacementError::NodeNotFound(NodeId::from(node_id)))?;
        for placement in &info.placements {
            self.vnodes.remove(&placement.position);
        }
        debug!(%node_id, vnodes = info.vnode_count(), "removed node from ring");
        Ok(info)
    }

    /// Return the node owning `key`: the first vnode at or after the key's
    /// position, wrapping around to the lowest position.
    ///
    /// Returns `None` if the ring is empty.
    pub fn node_for(&self, key: impl AsRef<[u8]>) -> Option<NodeId> {
        let pos = self.key_position(key);
        self.vnodes
            .range(pos..)
            .next()
            .or_else(|| self.vnodes.iter().next())
            .map(|(_, node_id)| node_id.clone())
    }

    /// Determine which nodes own `key`, primary first.
    ///
    /// Walks clockwise from the key's position on the ring, collecting up to
    /// `n` distinct physical node IDs. If fewer distinct nodes exist than
    /// `n`, returns all available nodes.
    pub fn replicas(&self, key: impl AsRef<[u8]>, n: usize) -> Vec<NodeId> {
        if self.vnodes.is_empty() || n == 0 {
            return Vec::new();
        }

        let pos = self.key_position(key);
        let max_distinct = n.min(self.nodes.len());
        let mut owners = Vec::with_capacity(max_distinct);

        // BTreeMap::range gives us everything >= pos, then we wrap around.
        let after = self.vnodes.range(pos..);
        let before = self.vnodes.range(..pos);

        for (_, node_id) in after.chain(before) {
            if !owners.contains(node_id) {
                owners.push(node_id.clone());
                if owners.len() == max_distinct {
                    break;
                }
            }
        }

        owners
    }

    /// Position of `key` on the ring.
    pub fn key_position(&self, key: impl AsRef<[u8]>) -> u64 {
        self.hasher.hash(key.as_ref())
    }

    /// Compute which keys must migrate between two ring states.
    ///
    /// For each key, any node that gained ownership in `new` is paired with
    /// a node from `old` that lost it.
    pub fn diff<K: AsRef<str>>(
        old: &Ring<H>,
        new: &Ring<H>,
        keys: &[K],
        n: usize,
    ) -> Vec<Migration> {
        let mut migrations = Vec::new();

        for key in keys {
            let key = key.as_ref();
            let old_owners = old.replicas(key, n);
            let new_owners = new.replicas(key, n);
            let mut losers = old_owners.iter().filter(|o| !new_owners.contains(o));

            for new_owner in new_owners.iter().filter(|o| !old_owners.contains(o)) {
                if let Some(from) = losers.next() {
                    migrations.push(Migration {
                        key: key.to_string(),
                        from: from.clone(),
                        to: new_owner.clone(),
                    });
                }
            }
        }

        migrations
    }

    /// Count how many of `keys` each node owns as primary.
    pub fn distribution<I, K>(&self, keys: I) -> BTreeMap<NodeId, usize>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut counts = BTreeMap::new();
        for key in keys {
            if let Some(owner) = self.node_for(key) {
                *counts.entry(owner).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Return the number of physical nodes in the ring.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return the total number of vnodes in the ring.
    pub fn vnode_count(&self) -> usize {
        self.vnodes.len()
    }

    /// Whether the ring has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current membership state.
    pub fn membership_state(&self) -> MembershipState {
        MembershipState::from_count(self.nodes.len())
    }

    /// Base vnodes per unit of weight.
    pub fn base_vnodes(&self) -> u32 {
        self.base_vnodes
    }

    /// Whether `node_id` is on the ring.
    pub fn contains_node(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    /// Return info about a specific node, if present.
    pub fn node_info(&self, node_id: &str) -> Option<&NodeInfo> {
        self.nodes.get(node_id)
    }

    /// Return all node IDs in the ring, sorted.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Return the sorted vnode positions of a node, if present.
    pub fn positions_of(&self, node_id: &str) -> Option<Vec<u64>> {
        self.nodes.get(node_id).map(|info| {
            let mut positions: Vec<u64> = info.placements.iter().map(|p| p.position).collect();
            positions.sort_unstable();
            positions
        })
    }

    /// Vnodes for a node of the given weight, checked against the cap before
    /// anything is allocated.
    fn vnode_count_for(&self, node_id: &NodeId, weight: f64) -> Result<usize, PlacementError> {
        let requested = (f64::from(self.base_vnodes) * weight).round().max(1.0);
        if requested > MAX_VNODES_PER_NODE as f64 {
            return Err(PlacementError::TooManyVnodes {
                node: node_id.clone(),
                requested,
                max: MAX_VNODES_PER_NODE,
            });
        }
        Ok(requested as usize)
    }

    /// Find a free position for vnode `index` of `node_id`.
    ///
    /// `claimed` holds positions already chosen for earlier vnodes of the
    /// same node that are not yet on the ring.
    fn place_vnode(
        &self,
        node_id: &NodeId,
        index: usize,
        claimed: &HashSet<u64>,
    ) -> Result<Placement, PlacementError> {
        let occupied = |pos: u64| self.vnodes.contains_key(&pos) || claimed.contains(&pos);

        let label = format!("{node_id}#{index}");
        let position = self.hasher.hash(label.as_bytes());
        if !occupied(position) {
            return Ok(Placement { label, position });
        }

        for attempt in 1..=MAX_COLLISION_RETRIES {
            let salted = format!("{label}~{attempt}");
            let position = self.hasher.hash(salted.as_bytes());
            if !occupied(position) {
                warn!(%node_id, index, attempt, "vnode position collided, using salted label");
                return Ok(Placement {
                    label: salted,
                    position,
                });
            }
        }

        Err(PlacementError::CollisionRetriesExhausted {
            node: node_id.clone(),
            vnode_index: index,
            attempts: MAX_COLLISION_RETRIES,
        })
    }
}
