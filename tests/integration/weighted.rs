//! Integration test: weighted capacity.
//!
//! Nodes with higher weight get proportionally more vnodes and therefore
//! own a proportionally larger share of keys.

use reef_cluster::ClusterManager;
use reef_integration_tests::seeded_keys;
use reef_placement::{Blake3Hasher, HasherKind, Ring};
use reef_types::NodeId;

fn share_ratio(cluster: &ClusterManager, keys: &[String], heavy: &str, light: &str) -> f64 {
    let counts = cluster.ring().distribution(keys);
    let heavy = counts.get(&NodeId::from(heavy)).copied().unwrap_or(0) as f64;
    let light = counts.get(&NodeId::from(light)).copied().unwrap_or(0) as f64;
    assert!(light > 0.0, "light node owns nothing");
    heavy / light
}

/// A(1) and B(4) over 1000 sampled keys: B owns about four times A's share.
#[test]
fn test_weight_four_owns_four_times_the_keys() {
    let mut cluster = ClusterManager::new(1000, 1);
    cluster.deploy("A", 1.0).unwrap();
    cluster.deploy("B", 4.0).unwrap();

    let ratio = share_ratio(&cluster, &seeded_keys(1_000, 1), "B", "A");
    assert!(
        (3.0..=5.4).contains(&ratio),
        "B/A ownership ratio {ratio:.2} too far from 4"
    );
}

/// With a larger sample the ratio lands within 15% of the weight ratio.
#[test]
fn test_weight_ratio_within_fifteen_percent() {
    let mut cluster = ClusterManager::new(1000, 1);
    cluster.deploy("A", 1.0).unwrap();
    cluster.deploy("B", 4.0).unwrap();

    let ratio = share_ratio(&cluster, &seeded_keys(20_000, 2), "B", "A");
    assert!(
        (3.4..=4.6).contains(&ratio),
        "B/A ownership ratio {ratio:.2} outside 4 ± 15%"
    );
}

/// Three tiers of weight keep their ordering and rough proportions.
#[test]
fn test_three_tier_weights() {
    let mut cluster = ClusterManager::new(500, 1);
    cluster.deploy("small", 1.0).unwrap();
    cluster.deploy("medium", 2.0).unwrap();
    cluster.deploy("large", 3.0).unwrap();

    let keys = seeded_keys(30_000, 3);
    let counts = cluster.ring().distribution(&keys);
    let share = |id: &str| counts[&NodeId::from(id)] as f64 / keys.len() as f64;

    let (small, medium, large) = (share("small"), share("medium"), share("large"));
    assert!(small < medium && medium < large, "{small:.3} {medium:.3} {large:.3}");
    assert!((0.12..=0.22).contains(&small), "small share {small:.3}");
    assert!((0.27..=0.40).contains(&medium), "medium share {medium:.3}");
    assert!((0.42..=0.58).contains(&large), "large share {large:.3}");
}

/// Fractional weights scale the vnode count by rounding.
#[test]
fn test_fractional_weight_vnodes() {
    let mut cluster = ClusterManager::new(100, 1);
    cluster.deploy("half", 0.5).unwrap();
    cluster.deploy("one-and-a-third", 1.333).unwrap();

    let ring = cluster.ring();
    assert_eq!(ring.node_info("half").unwrap().vnode_count(), 50);
    assert_eq!(ring.node_info("one-and-a-third").unwrap().vnode_count(), 133);
}

/// Weighting works the same with the BLAKE3 hasher.
#[test]
fn test_weighting_independent_of_hasher() {
    let mut ring = Ring::with_hasher(1000, Blake3Hasher);
    ring.add_node("A", 1.0).unwrap();
    ring.add_node("B", 4.0).unwrap();

    let counts = ring.distribution(seeded_keys(20_000, 4));
    let ratio = counts[&NodeId::from("B")] as f64 / counts[&NodeId::from("A")] as f64;
    assert!((3.4..=4.6).contains(&ratio), "ratio {ratio:.2}");

    let mut by_kind = ClusterManager::with_hasher(1000, 1, HasherKind::Blake3);
    by_kind.deploy("A", 1.0).unwrap();
    by_kind.deploy("B", 4.0).unwrap();
    assert_eq!(
        by_kind.ring().distribution(seeded_keys(20_000, 4)),
        counts,
        "config-selected hasher must match the concrete one"
    );
}
