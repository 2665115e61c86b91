use geocluster::index::snapshot;
use geocluster::{
    ClusterQuery, GeohashTree, LatLng, MarkerData, MarkerKind, StoreRef, TruncationPolicy,
    traverse, truncate, zoom_to_precision,
};
use std::collections::HashSet;

const ALPHABET: &[u8] = b"0123456789bcdefghjkmnpqrstuvwxyz";

const SAN_FRANCISCO: LatLng = LatLng {
    lat: 37.7749,
    lng: -122.4194,
};

fn alpha(i: usize) -> char {
    ALPHABET[i % ALPHABET.len()] as char
}

/// Deterministic xorshift so the sequences below are reproducible.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

fn random_geohash(rng: &mut XorShift, prefix: &str, len: usize) -> String {
    let mut hash = prefix.to_string();
    while hash.len() < len {
        hash.push(alpha(rng.below(ALPHABET.len())));
    }
    hash
}

#[test]
fn test_inserted_store_is_returned_once() {
    let mut tree = GeohashTree::default();
    let store = StoreRef::new("9q8yyk8yu", "store-1");

    assert!(tree.insert(&store).unwrap());
    assert!(!tree.insert(&store).unwrap());

    for prefix in ["", "9", "9q8", "9q8yyk", "9q8yyk8yu"] {
        let found = tree.get_stores_in_geohash(prefix);
        assert_eq!(found, vec![store.clone()], "prefix '{prefix}'");
    }
}

#[test]
fn test_removed_store_never_reappears() {
    // Regression: removal must filter the terminal leaf list, not only counts.
    let mut tree = GeohashTree::default();
    let removed = StoreRef::new("9q8yyk8yu", "gone");
    let sibling = StoreRef::new("9q8yyk8yv", "stays");
    tree.insert(&removed).unwrap();
    tree.insert(&sibling).unwrap();

    assert!(tree.remove(&removed));

    for prefix in ["", "9", "9q8y", "9q8yyk", "9q8yyk8yu"] {
        let keys: Vec<_> = tree
            .get_stores_in_geohash(prefix)
            .into_iter()
            .map(|s| s.key)
            .collect();
        assert!(!keys.contains(&"gone".to_string()), "prefix '{prefix}'");
    }

    let result = traverse(
        tree.root(),
        &ClusterQuery::for_viewport(16, SAN_FRANCISCO, 1.3),
    );
    assert_eq!(result.keys_to_fetch, vec![sibling.clone()]);

    let restored = snapshot::deserialize(&snapshot::serialize(&tree).unwrap(), 6).unwrap();
    assert_eq!(restored.get_stores_in_geohash("9q8yyk"), vec![sibling]);
}

#[test]
fn test_store_count_invariant_under_random_edits() {
    let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);
    let mut tree = GeohashTree::default();
    let mut live: Vec<StoreRef> = Vec::new();

    for step in 0..2_000 {
        if live.is_empty() || rng.below(3) > 0 {
            let len = 3 + rng.below(7);
            let geohash = random_geohash(&mut rng, "9q", len);
            let store = StoreRef::new(geohash, format!("s{step}"));
            assert!(tree.insert(&store).unwrap());
            live.push(store);
        } else {
            let store = live.swap_remove(rng.below(live.len()));
            assert!(tree.remove(&store));
        }

        if step % 100 == 0 {
            tree.validate().unwrap();
        }
    }

    tree.validate().unwrap();
    assert_eq!(tree.store_count(), live.len());

    let indexed: HashSet<_> = tree.get_stores_in_geohash("").into_iter().collect();
    let expected: HashSet<_> = live.into_iter().collect();
    assert_eq!(indexed, expected);
}

#[test]
fn test_deserialized_tree_behaves_identically() {
    let mut rng = XorShift(42);
    let mut tree = GeohashTree::default();
    for i in 0..300 {
        let geohash = random_geohash(&mut rng, "", 9);
        tree.insert(&StoreRef::new(geohash, format!("k{i}"))).unwrap();
    }

    let mut restored = snapshot::deserialize(&snapshot::serialize(&tree).unwrap(), 6).unwrap();
    assert_eq!(restored, tree);

    let center = LatLng::new(20.0, 10.0);
    for zoom in [0u8, 3, 6, 9, 11, 14] {
        let query = ClusterQuery::for_viewport(zoom, center, 1.3);
        assert_eq!(traverse(tree.root(), &query), traverse(restored.root(), &query));
    }

    let extra = StoreRef::new("u4pruydqq", "extra");
    let victim = tree.get_stores_in_geohash("")[17].clone();
    for t in [&mut tree, &mut restored] {
        t.insert(&extra).unwrap();
        assert!(t.remove(&victim));
    }
    assert_eq!(restored, tree);
}

#[test]
fn test_zoom_to_precision_table() {
    assert_eq!(zoom_to_precision(12), 9);
    assert_eq!(zoom_to_precision(11), 5);
    assert_eq!(zoom_to_precision(9), 4);
    assert_eq!(zoom_to_precision(6), 3);
    assert_eq!(zoom_to_precision(3), 2);
    assert_eq!(zoom_to_precision(1), 1);
}

#[test]
fn test_scenario_single_store_at_street_zoom() {
    let mut tree = GeohashTree::new(6);
    tree.insert(&StoreRef::new("9q8yyk8y", "sf")).unwrap();

    let query = ClusterQuery::new(zoom_to_precision(14), 14, SAN_FRANCISCO, 50.0);
    let result = traverse(tree.root(), &query);

    assert_eq!(
        result.markers,
        vec![MarkerData::new(MarkerKind::Marker, "9q8yyk8y", 1)]
    );
    assert_eq!(result.keys_to_fetch, vec![StoreRef::new("9q8yyk8y", "sf")]);
}

#[test]
fn test_scenario_west_coast_cluster_excludes_new_york() {
    let mut tree = GeohashTree::new(6);
    for i in 0..50 {
        let geohash = format!("9q8yy{}{}0", alpha(i), alpha(i / 32));
        tree.insert(&StoreRef::new(geohash, format!("sf-{i}"))).unwrap();
    }
    tree.insert(&StoreRef::new("dr5regw3", "nyc")).unwrap();
    assert_eq!(tree.store_count(), 51);

    let query = ClusterQuery::for_viewport(9, SAN_FRANCISCO, 1.3);
    assert_eq!(query.target_precision, 4);
    let result = traverse(tree.root(), &query);

    assert_eq!(result.markers.len(), 1);
    let marker = &result.markers[0];
    assert_eq!(marker.kind, MarkerKind::OptimalCluster);
    assert_eq!(marker.count, 50);
    assert!(marker.geohash.starts_with("9q8y"));
    assert_eq!(marker.geohash, "9q8yy");

    assert_eq!(result.keys_to_fetch.len(), 50);
    assert!(result.keys_to_fetch.iter().all(|s| s.key != "nyc"));
}

#[test]
fn test_scenario_street_zoom_returns_every_marker() {
    let mut tree = GeohashTree::new(6);
    for i in 0..35 {
        let cell = if i < 20 { "9q8yyk" } else { "9q8yym" };
        let geohash = format!("{cell}{}{}0", alpha(i), alpha(i + 7));
        tree.insert(&StoreRef::new(geohash, format!("store-{i}"))).unwrap();
    }

    let query = ClusterQuery::for_viewport(14, SAN_FRANCISCO, 1.3);
    let result = traverse(tree.root(), &query);

    assert_eq!(result.markers.len(), 35);
    assert!(result.markers.iter().all(|m| m.kind == MarkerKind::Marker));
    assert_eq!(result.keys_to_fetch.len(), 35);

    let cut = truncate(result, 14, &TruncationPolicy::default());
    assert_eq!(cut.markers.len(), 20);
    assert_eq!(cut.keys_to_fetch.len(), 35);
}
