//! JSON snapshot of a tree's node graph.
//!
//! The snapshot is the root node document only; precision is supplied by the
//! caller on load (it comes from configuration, not from the document).
//! Loading validates the count invariant so a corrupt document surfaces as
//! [`ClusterError::MalformedSnapshot`] instead of producing wrong clusters.

use super::node::GeohashNode;
use super::tree::GeohashTree;
use crate::compute::geohash::{MAX_GEOHASH_PRECISION, is_valid_geohash};
use crate::error::{ClusterError, Result};
use rustc_hash::FxHashSet;

/// Serialize a tree to its compact JSON snapshot.
pub fn serialize(tree: &GeohashTree) -> Result<String> {
    Ok(serde_json::to_string(tree.root())?)
}

/// Serialize a tree to indented JSON.
pub fn serialize_pretty(tree: &GeohashTree) -> Result<String> {
    Ok(serde_json::to_string_pretty(tree.root())?)
}

/// Serialize a tree to a JSON value, for stores that keep documents as values.
pub fn to_value(tree: &GeohashTree) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(tree.root())?)
}

/// Rebuild a tree from a JSON snapshot.
///
/// # Errors
///
/// Returns `ClusterError::MalformedSnapshot` when the document does not parse
/// into a node graph, contains non-geohash child keys, holds a leaf that is
/// duplicated or misplaced, or violates the `storeCount` invariant.
pub fn deserialize(data: &str, precision: usize) -> Result<GeohashTree> {
    let root: GeohashNode = serde_json::from_str(data)
        .map_err(|e| ClusterError::MalformedSnapshot(e.to_string()))?;
    from_root(root, precision)
}

/// Rebuild a tree from a JSON value.
pub fn from_value(value: serde_json::Value, precision: usize) -> Result<GeohashTree> {
    let root: GeohashNode = serde_json::from_value(value)
        .map_err(|e| ClusterError::MalformedSnapshot(e.to_string()))?;
    from_root(root, precision)
}

fn from_root(root: GeohashNode, precision: usize) -> Result<GeohashTree> {
    if !(1..=MAX_GEOHASH_PRECISION).contains(&precision) {
        return Err(ClusterError::InvalidInput(format!(
            "Geohash precision must be between 1 and {}, got: {}",
            MAX_GEOHASH_PRECISION, precision
        )));
    }

    check_shape(&root, precision)?;

    let tree = GeohashTree::from_root(root, precision);
    tree.validate()?;
    Ok(tree)
}

fn check_shape(node: &GeohashNode, precision: usize) -> Result<()> {
    if node.geohash().len() > precision {
        return Err(ClusterError::MalformedSnapshot(format!(
            "node '{}' is deeper than precision {}",
            node.geohash(),
            precision
        )));
    }

    let mut seen = FxHashSet::default();
    for store in node.stores() {
        if !is_valid_geohash(&store.geohash) {
            return Err(ClusterError::MalformedSnapshot(format!(
                "store '{}' has invalid geohash '{}'",
                store.key, store.geohash
            )));
        }
        // Leaves live exactly where insert would have put them.
        if !store.geohash.starts_with(node.geohash())
            || node.geohash().len() != precision.min(store.geohash.len())
        {
            return Err(ClusterError::MalformedSnapshot(format!(
                "store '{}' ({}) is misplaced under node '{}'",
                store.key,
                store.geohash,
                node.geohash()
            )));
        }
        if !seen.insert(store.key.as_str()) {
            return Err(ClusterError::MalformedSnapshot(format!(
                "store '{}' appears twice under node '{}'",
                store.key,
                node.geohash()
            )));
        }
    }

    for (c, child) in node.children() {
        if !crate::compute::geohash::is_geohash_char(c) {
            return Err(ClusterError::MalformedSnapshot(format!(
                "child key '{}' under '{}' is not a geohash character",
                c,
                node.geohash()
            )));
        }
        check_shape(child, precision)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::node::StoreRef;

    fn sample_tree() -> GeohashTree {
        let mut tree = GeohashTree::new(6);
        tree.insert(&StoreRef::new("9q8yyk8y", "sf-1")).unwrap();
        tree.insert(&StoreRef::new("9q8yyk9z", "sf-2")).unwrap();
        tree.insert(&StoreRef::new("dr5regw3", "nyc")).unwrap();
        tree
    }

    #[test]
    fn test_roundtrip_is_field_equal() {
        let tree = sample_tree();
        let json = serialize(&tree).unwrap();
        let restored = deserialize(&json, 6).unwrap();
        assert_eq!(restored, tree);

        let pretty = serialize_pretty(&tree).unwrap();
        assert_eq!(deserialize(&pretty, 6).unwrap(), tree);

        let value = to_value(&tree).unwrap();
        assert_eq!(from_value(value, 6).unwrap(), tree);
    }

    #[test]
    fn test_roundtrip_behaves_identically() {
        let mut original = sample_tree();
        let mut restored = deserialize(&serialize(&original).unwrap(), 6).unwrap();

        for tree in [&mut original, &mut restored] {
            tree.insert(&StoreRef::new("9q8yyk00", "sf-3")).unwrap();
            assert!(tree.remove(&StoreRef::new("9q8yyk8y", "sf-1")));
        }

        assert_eq!(original, restored);
        assert_eq!(
            original.get_stores_in_geohash("9q8"),
            restored.get_stores_in_geohash("9q8")
        );
    }

    #[test]
    fn test_reads_documents_without_optional_fields() {
        let json = r#"{
            "geohash": "",
            "storeCount": 1,
            "children": {
                "9": {
                    "geohash": "9",
                    "storeCount": 1,
                    "stores": [{"geohash": "9q8yyk8y", "key": "sf"}]
                }
            }
        }"#;
        let tree = deserialize(json, 1).unwrap();
        assert_eq!(tree.store_count(), 1);
        assert_eq!(tree.get_stores_in_geohash("9")[0].key, "sf");
    }

    #[test]
    fn test_rejects_garbage() {
        let err = deserialize("not json", 6).unwrap_err();
        assert!(err.is_malformed_snapshot());

        let err = deserialize(r#"{"geohash": ""}"#, 6).unwrap_err();
        assert!(err.is_malformed_snapshot());
    }

    #[test]
    fn test_rejects_count_mismatch() {
        let json = r#"{
            "geohash": "",
            "storeCount": 5,
            "children": {
                "9": {
                    "geohash": "9",
                    "storeCount": 1,
                    "stores": [{"geohash": "9q", "key": "a"}],
                    "children": {}
                }
            }
        }"#;
        assert!(deserialize(json, 1).unwrap_err().is_malformed_snapshot());
    }

    #[test]
    fn test_rejects_nodes_deeper_than_precision() {
        let json = serialize(&sample_tree()).unwrap();
        assert!(deserialize(&json, 3).unwrap_err().is_malformed_snapshot());
    }

    #[test]
    fn test_rejects_bad_child_key() {
        let json = r#"{
            "geohash": "",
            "storeCount": 1,
            "children": {
                "a": {
                    "geohash": "a",
                    "storeCount": 1,
                    "stores": [{"geohash": "9q", "key": "a"}],
                    "children": {}
                }
            }
        }"#;
        assert!(deserialize(json, 1).unwrap_err().is_malformed_snapshot());
    }

    #[test]
    fn test_rejects_duplicate_key_in_leaf_list() {
        let json = r#"{
            "geohash": "",
            "storeCount": 2,
            "children": {
                "9": {
                    "geohash": "9",
                    "storeCount": 2,
                    "stores": [{"geohash": "9q", "key": "a"}, {"geohash": "9q", "key": "a"}]
                }
            }
        }"#;
        assert!(deserialize(json, 1).unwrap_err().is_malformed_snapshot());
    }

    #[test]
    fn test_rejects_leaf_outside_its_cell() {
        let json = r#"{
            "geohash": "",
            "storeCount": 1,
            "children": {
                "9": {
                    "geohash": "9",
                    "storeCount": 1,
                    "stores": [{"geohash": "dr5r", "key": "nyc"}]
                }
            }
        }"#;
        assert!(deserialize(json, 1).unwrap_err().is_malformed_snapshot());
    }

    #[test]
    fn test_rejects_leaf_at_wrong_depth() {
        // Precision 2 puts "9q8y" under "9q", not under "9".
        let json = r#"{
            "geohash": "",
            "storeCount": 1,
            "children": {
                "9": {
                    "geohash": "9",
                    "storeCount": 1,
                    "stores": [{"geohash": "9q8y", "key": "sf"}]
                }
            }
        }"#;
        assert!(deserialize(json, 2).unwrap_err().is_malformed_snapshot());

        // A short geohash legitimately terminates above the precision.
        let short = r#"{
            "geohash": "",
            "storeCount": 1,
            "children": {
                "9": {
                    "geohash": "9",
                    "storeCount": 1,
                    "stores": [{"geohash": "9", "key": "coarse"}]
                }
            }
        }"#;
        let mut tree = deserialize(short, 2).unwrap();
        assert!(tree.remove(&StoreRef::new("9", "coarse")));
        assert!(tree.is_empty());
        tree.validate().unwrap();
    }
}
