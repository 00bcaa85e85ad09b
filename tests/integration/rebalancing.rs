//! Integration test: rebalancing.
//!
//! Add and remove nodes, verify only a bounded fraction of keys changes
//! owner and that replicated data stays readable through a join.

use reef_cluster::ReadOutcome;
use reef_integration_tests::{
    moved_fraction, node_name, payload, primaries, seeded_keys, unit_cluster,
};
use reef_placement::{Ring, RingHasher, XxHasher};

/// Fraction of keys a `hash % n` scheme would move going from `n` to `n + 1`.
fn modulo_moved_fraction(keys: &[String], n: u64) -> f64 {
    let moved = keys
        .iter()
        .map(|k| XxHasher.hash(k.as_bytes()))
        .filter(|h| h % n != h % (n + 1))
        .count();
    moved as f64 / keys.len() as f64
}

/// Adding one unit node to 4 moves about 1/5 of keys, all to the new node.
#[test]
fn test_join_moves_about_one_fifth() {
    let mut cluster = unit_cluster(4, 100, 1);
    let keys = seeded_keys(10_000, 42);
    let before = primaries(cluster.ring(), &keys);

    cluster.deploy(node_name(4), 1.0).unwrap();
    let after = primaries(cluster.ring(), &keys);

    for (b, a) in before.iter().zip(&after) {
        if b != a {
            assert_eq!(a.as_str(), node_name(4), "keys may only move to the joiner");
        }
    }

    let fraction = moved_fraction(&before, &after);
    assert!(
        (0.12..=0.30).contains(&fraction),
        "expected ~0.20 of keys to move, got {fraction:.3}"
    );

    let naive = modulo_moved_fraction(&keys, 4);
    assert!(naive > 0.7, "modulo placement should move most keys, got {naive:.3}");
    assert!(fraction < naive / 2.0);
}

/// With 9 nodes a join moves about 1/10.
#[test]
fn test_join_disruption_shrinks_with_cluster_size() {
    let mut cluster = unit_cluster(9, 100, 1);
    let keys = seeded_keys(10_000, 43);
    let before = primaries(cluster.ring(), &keys);

    cluster.deploy(node_name(9), 1.0).unwrap();
    let fraction = moved_fraction(&before, &primaries(cluster.ring(), &keys));
    assert!(
        (0.05..=0.16).contains(&fraction),
        "expected ~0.10 of keys to move, got {fraction:.3}"
    );
}

/// Failing a node only re-homes its own keys, each to its old second replica.
#[test]
fn test_leave_moves_only_departed_keys() {
    let mut cluster = unit_cluster(5, 100, 2);
    let keys = seeded_keys(5_000, 44);
    let before: Vec<_> = keys.iter().map(|k| cluster.owners(k)).collect();

    cluster.fail(&node_name(1)).unwrap();

    for (key, owners) in keys.iter().zip(&before) {
        let now = cluster.primary(key).unwrap();
        if owners[0].as_str() == node_name(1) {
            assert_eq!(now, owners[1], "{key} should move to its clockwise successor");
        } else {
            assert_eq!(now, owners[0], "{key} did not live on the failed node");
        }
    }
}

/// With replication 2, a join never hides data: the old primary is always
/// still among the new replicas.
#[test]
fn test_join_keeps_replicated_keys_readable() {
    let mut cluster = unit_cluster(3, 100, 2);
    let keys = seeded_keys(1_000, 45);
    for key in &keys {
        cluster.write(key, payload(key)).unwrap();
    }

    cluster.deploy(node_name(3), 1.0).unwrap();

    for key in &keys {
        match cluster.read(key).unwrap() {
            ReadOutcome::Found(hit) => assert_eq!(hit.value, payload(key)),
            other => panic!("{key} unreadable after join: {other:?}"),
        }
    }
}

/// The migration plan covers exactly the keys whose primary changed.
#[test]
fn test_diff_matches_observed_moves() {
    let cluster = unit_cluster(4, 100, 1);
    let keys = seeded_keys(2_000, 46);

    let mut joined = cluster.ring().clone();
    joined.add_node("joiner", 2.0).unwrap();

    let migrations = Ring::diff(cluster.ring(), &joined, &keys, 1);
    let before = primaries(cluster.ring(), &keys);
    let after = primaries(&joined, &keys);
    let moved = before.iter().zip(&after).filter(|(b, a)| b != a).count();

    assert_eq!(migrations.len(), moved);
    assert!(migrations.iter().all(|m| m.to.as_str() == "joiner"));
}
