//! Integration test: deterministic placement.
//!
//! Independent rings built the same way agree on every key, membership
//! round trips restore the exact vnode layout, and replica sets are
//! distinct and clockwise-ordered.

use std::collections::HashSet;

use reef_cluster::{ClusterConfig, ClusterManager};
use reef_integration_tests::{node_name, primaries, seeded_keys, unit_cluster};
use reef_placement::Ring;

/// Two clusters built from the same config route every key identically.
#[test]
fn test_independent_clusters_agree() {
    let config = ClusterConfig::from_toml(
        r#"
[replication]
factor = 3

[[nodes]]
id = "alpha"
weight = 1.0

[[nodes]]
id = "beta"
weight = 2.0

[[nodes]]
id = "gamma"
weight = 0.5
"#,
    )
    .unwrap();

    let first = ClusterManager::from_config(&config).unwrap();
    let second = ClusterManager::from_config(&config).unwrap();

    for key in seeded_keys(2_000, 100) {
        assert_eq!(first.owners(&key), second.owners(&key), "{key} placed differently");
        assert_eq!(first.primary(&key), first.primary(&key));
    }
}

/// Insertion order of nodes does not affect placement.
#[test]
fn test_deploy_order_does_not_matter() {
    let mut forward = Ring::new(100);
    let mut backward = Ring::new(100);
    for i in 0..5 {
        forward.add_node(node_name(i), 1.0).unwrap();
        backward.add_node(node_name(4 - i), 1.0).unwrap();
    }

    let keys = seeded_keys(2_000, 101);
    assert_eq!(primaries(&forward, &keys), primaries(&backward, &keys));
}

/// Failing a node and redeploying it with the same weight restores the
/// identical vnode layout and therefore identical placement.
#[test]
fn test_fail_and_redeploy_restores_layout() {
    let mut cluster = unit_cluster(4, 100, 2);
    let keys = seeded_keys(2_000, 102);

    let layout_before: Vec<Option<Vec<u64>>> = (0..4)
        .map(|i| cluster.ring().positions_of(&node_name(i)))
        .collect();
    let owners_before: Vec<_> = keys.iter().map(|k| cluster.owners(k)).collect();

    cluster.fail(&node_name(2)).unwrap();
    cluster.deploy(node_name(2), 1.0).unwrap();

    let layout_after: Vec<Option<Vec<u64>>> = (0..4)
        .map(|i| cluster.ring().positions_of(&node_name(i)))
        .collect();
    let owners_after: Vec<_> = keys.iter().map(|k| cluster.owners(k)).collect();

    assert_eq!(layout_before, layout_after);
    assert_eq!(owners_before, owners_after);
}

/// Replica sets are distinct, sized `min(n, nodes)`, and nested by `n`.
#[test]
fn test_replica_sets_distinct_and_nested() {
    let cluster = unit_cluster(4, 100, 2);
    let ring = cluster.ring();

    for key in seeded_keys(500, 103) {
        let full = ring.replicas(&key, 10);
        assert_eq!(full.len(), 4);
        let unique: HashSet<_> = full.iter().collect();
        assert_eq!(unique.len(), 4, "duplicate owner for {key}");

        for n in 1..=4 {
            assert_eq!(ring.replicas(&key, n), full[..n].to_vec());
        }
        assert_eq!(Some(full[0].clone()), ring.node_for(&key));
    }
}
