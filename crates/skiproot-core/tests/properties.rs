//! Structural properties of the authenticated skip list.

use std::collections::HashSet;

use proptest::prelude::*;
use skiproot_canonical::{hash_value, sha256};
use skiproot_core::{
    AuthSkipList, CoinFlips, CoreError, FixedHeights, RecomputeStrategy, SkipListConfig,
};

fn fixed(max_level: usize, heights: &[usize]) -> AuthSkipList<u64> {
    AuthSkipList::with_sampler(
        SkipListConfig::with_max_level(max_level),
        FixedHeights::new(heights.to_vec()),
    )
}

fn build(max_level: usize, keys: &[u64], heights: &[usize]) -> AuthSkipList<u64> {
    let mut list = fixed(max_level, heights);
    for &key in keys {
        list.insert(key).unwrap();
    }
    list
}

#[test]
fn four_element_list_matches_hand_computed_layout() {
    let mut list = build(5, &[1001, 1501, 1999, 2500], &[0, 2, 1, 0]);

    assert_eq!(list.len(), 4);
    let heads: Vec<u64> = (0..=5).map(|l| list.node(list.head(l)).rank()).collect();
    assert_eq!(heads, vec![4, 3, 3, 0, 0, 0]);

    let level1: Vec<(Option<u64>, u64)> = list
        .level_nodes(1)
        .map(|(_, n)| (n.key().copied(), n.rank()))
        .collect();
    assert_eq!(level1, vec![(None, 3), (Some(1501), 1), (Some(1999), 2)]);

    let level2: Vec<(Option<u64>, u64)> = list
        .level_nodes(2)
        .map(|(_, n)| (n.key().copied(), n.rank()))
        .collect();
    assert_eq!(level2, vec![(None, 3), (Some(1501), 3)]);

    assert_eq!(*list.key_at_rank(3).unwrap(), 1999);
    let proof = list.prove_at_rank(3).unwrap();
    assert_eq!(proof.leaf, hash_value(&1999u64));
    assert_eq!(list.leaf_commitment_at(3).unwrap(), proof.leaf);

    let root = list.get_root().unwrap();
    list.recompute();
    assert_eq!(list.get_root().unwrap(), root);
}

#[test]
fn single_level_root_changes_on_every_insert() {
    let mut list = fixed(0, &[]);
    let mut seen = HashSet::new();
    for key in [5u64, 3, 9, 1, 7] {
        list.insert(key).unwrap();
        assert!(seen.insert(list.get_root().unwrap()), "root repeated after {}", key);
    }
    assert_eq!(list.level_nodes(0).count(), 6);
}

#[test]
fn root_is_the_top_head_label() {
    let list = build(3, &[10, 20, 30], &[1, 3, 0]);
    let top = list.node(list.top());
    assert_eq!(Some(&list.get_root().unwrap()), top.label());
    assert_eq!(sha256(top.raw_bytes()), list.get_root().unwrap());
}

#[test]
fn empty_list_has_nothing_to_prove() {
    let list = fixed(2, &[]);
    assert!(matches!(list.get_root(), Err(CoreError::UninitializedRoot)));
    assert!(matches!(
        list.prove_at_rank(1),
        Err(CoreError::OutOfRange { rank: 1, len: 0 })
    ));
}

#[test]
fn ranks_outside_the_list_are_rejected() {
    let list = build(2, &[1, 2, 3], &[0, 1, 2]);
    for rank in [0, 4, u64::MAX] {
        assert!(matches!(
            list.prove_at_rank(rank),
            Err(CoreError::OutOfRange { len: 3, .. })
        ));
        assert!(list.key_at_rank(rank).is_err());
    }
}

#[test]
fn seeded_coin_gives_reproducible_roots() {
    let keys: Vec<u64> = (0..200).map(|i| (i * 7919) % 1009).collect();
    let roots: Vec<_> = (0..2)
        .map(|_| {
            let mut list =
                AuthSkipList::with_sampler(SkipListConfig::with_max_level(6), CoinFlips::seeded(99));
            for &key in &keys {
                list.insert(key).unwrap();
            }
            list.get_root().unwrap()
        })
        .collect();
    assert_eq!(roots[0], roots[1]);
}

#[test]
fn insertion_order_does_not_matter_for_fixed_towers() {
    // Heights follow the key, not the insertion order.
    let height_of = |key: u64| (key % 4) as usize;
    let forward: Vec<u64> = (1..=40).collect();
    let backward: Vec<u64> = forward.iter().rev().copied().collect();

    let mut a: AuthSkipList<u64> = AuthSkipList::new(3);
    let mut b: AuthSkipList<u64> = AuthSkipList::new(3);
    for (&x, &y) in forward.iter().zip(&backward) {
        a.insert_with_height(x, height_of(x)).unwrap();
        b.insert_with_height(y, height_of(y)).unwrap();
    }
    assert_eq!(a.get_root().unwrap(), b.get_root().unwrap());
}

#[test]
fn string_keys_are_supported() {
    let mut list: AuthSkipList<String> =
        AuthSkipList::with_sampler(SkipListConfig::with_max_level(2), FixedHeights::new(vec![1, 0, 2]));
    for key in ["pear", "apple", "fig"] {
        list.insert(key.to_string()).unwrap();
    }
    assert_eq!(list.key_at_rank(1).unwrap(), "apple");
    assert_eq!(list.key_at_rank(3).unwrap(), "pear");
    assert_eq!(
        list.prove_at_rank(2).unwrap().leaf,
        hash_value(&"fig".to_string())
    );
}

proptest! {
    #[test]
    fn invariants_hold_for_arbitrary_inserts(
        entries in prop::collection::vec((0u64..10_000, 0usize..6), 1..80),
        incremental in any::<bool>(),
    ) {
        let recompute = if incremental {
            RecomputeStrategy::Incremental
        } else {
            RecomputeStrategy::Full
        };
        let mut list: AuthSkipList<u64> =
            AuthSkipList::with_config(SkipListConfig { max_level: 4, recompute });
        let mut expected = Vec::new();

        for &(key, height) in &entries {
            match list.insert_with_height(key, height.min(4)) {
                Ok(()) => expected.push(key),
                Err(CoreError::DuplicateKey) => prop_assert!(expected.contains(&key)),
                Err(e) => return Err(TestCaseError::fail(e.to_string())),
            }
        }
        expected.sort_unstable();

        prop_assert!(list.check_invariants().is_ok());
        prop_assert_eq!(list.len(), expected.len() as u64);
        let keys: Vec<u64> = list.keys().copied().collect();
        prop_assert_eq!(&keys, &expected);

        prop_assert_eq!(list.node(list.head(0)).rank(), list.len());
        for level in 0..=4 {
            let real: u64 = list
                .level_nodes(level)
                .filter(|(_, n)| !n.is_head())
                .map(|(_, n)| n.rank())
                .sum();
            prop_assert_eq!(list.node(list.head(level)).rank(), real);
        }
        for (i, key) in expected.iter().enumerate() {
            prop_assert_eq!(list.key_at_rank(i as u64 + 1).unwrap(), key);
        }
    }

    #[test]
    fn incremental_and_full_agree(
        entries in prop::collection::vec((0u64..500, 0usize..4), 1..60),
    ) {
        let mut full: AuthSkipList<u64> = AuthSkipList::new(3);
        let mut incremental: AuthSkipList<u64> = AuthSkipList::with_config(SkipListConfig {
            max_level: 3,
            recompute: RecomputeStrategy::Incremental,
        });
        for &(key, height) in &entries {
            let a = full.insert_with_height(key, height);
            let b = incremental.insert_with_height(key, height);
            prop_assert_eq!(a.is_ok(), b.is_ok());
            prop_assert_eq!(full.get_root().unwrap(), incremental.get_root().unwrap());
        }
    }
}
