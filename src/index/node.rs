//! Node and leaf types of the geohash prefix tree.
//!
//! The serde shape of these types is the persisted snapshot format:
//!
//! ```text
//! {
//!   "geohash": "9q8y",
//!   "storeCount": 3,
//!   "stores": [{ "geohash": "9q8yyk8yu", "key": "store-1" }],   // terminal nodes only
//!   "children": { "y": { ... } }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A store reference held in a terminal node: the store's key plus its
/// full-length geohash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreRef {
    pub geohash: String,
    pub key: String,
}

impl StoreRef {
    pub fn new<G: Into<String>, K: Into<String>>(geohash: G, key: K) -> Self {
        Self {
            geohash: geohash.into(),
            key: key.into(),
        }
    }
}

/// One node per geohash prefix.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeohashNode {
    pub(crate) geohash: String,
    pub(crate) store_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) stores: Option<Vec<StoreRef>>,
    #[serde(default)]
    pub(crate) children: BTreeMap<char, GeohashNode>,
}

impl GeohashNode {
    /// Create an empty node for `prefix`.
    pub fn new<S: Into<String>>(prefix: S) -> Self {
        Self {
            geohash: prefix.into(),
            store_count: 0,
            stores: None,
            children: BTreeMap::new(),
        }
    }

    /// The prefix this node represents. Empty for the root.
    pub fn geohash(&self) -> &str {
        &self.geohash
    }

    /// Number of stores in this node's subtree.
    pub fn store_count(&self) -> usize {
        self.store_count
    }

    /// Leaf entries held directly by this node (empty for internal nodes).
    pub fn stores(&self) -> &[StoreRef] {
        self.stores.as_deref().unwrap_or(&[])
    }

    /// Whether this node carries a leaf list.
    pub fn has_stores(&self) -> bool {
        self.stores.as_ref().is_some_and(|s| !s.is_empty())
    }

    pub fn child(&self, c: char) -> Option<&GeohashNode> {
        self.children.get(&c)
    }

    /// Children in ascending character order.
    pub fn children(&self) -> impl Iterator<Item = (char, &GeohashNode)> {
        self.children.iter().map(|(c, node)| (*c, node))
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store_count == 0
    }

    /// Appends every leaf entry in this subtree to `out`.
    pub fn collect_stores(&self, out: &mut Vec<StoreRef>) {
        out.extend_from_slice(self.stores());
        for child in self.children.values() {
            child.collect_stores(out);
        }
    }

    /// All leaf entries in this subtree.
    pub fn all_stores(&self) -> Vec<StoreRef> {
        let mut out = Vec::with_capacity(self.store_count);
        self.collect_stores(&mut out);
        out
    }

    pub(crate) fn child_or_insert(&mut self, c: char) -> &mut GeohashNode {
        let prefix = &self.geohash;
        self.children.entry(c).or_insert_with(|| {
            let mut child_prefix = String::with_capacity(prefix.len() + 1);
            child_prefix.push_str(prefix);
            child_prefix.push(c);
            GeohashNode::new(child_prefix)
        })
    }

    /// Checks the count invariant and prefix consistency for this subtree.
    ///
    /// `store_count` must equal the number of own leaves plus the sum of the
    /// children's counts, and every child's prefix must be this prefix plus
    /// its map key.
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        let mut expected = self.stores().len();

        for (c, child) in &self.children {
            let mut child_prefix = self.geohash.clone();
            child_prefix.push(*c);
            if child.geohash != child_prefix {
                return Err(format!(
                    "child '{}' of '{}' has prefix '{}'",
                    c, self.geohash, child.geohash
                ));
            }
            if child.store_count == 0 {
                return Err(format!("empty node '{}' was not pruned", child.geohash));
            }
            child.check_invariants()?;
            expected += child.store_count;
        }

        if self.store_count != expected {
            return Err(format!(
                "node '{}' has storeCount {} but holds {}",
                self.geohash, self.store_count, expected
            ));
        }

        Ok(())
    }
}
