//! Geohash prefix tree holding one tenant's store references.

use super::node::{GeohashNode, StoreRef};
use crate::compute::geohash::MAX_GEOHASH_PRECISION;
use crate::compute::validation::validate_geohash;
use crate::error::{ClusterError, Result};
use std::fmt;

/// Default index precision: terminal nodes sit at 6-character prefixes.
pub const DEFAULT_PRECISION: usize = 6;

/// Shape statistics for a tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeStats {
    /// Total nodes including the root
    pub node_count: usize,
    /// Nodes holding a leaf list
    pub leaf_node_count: usize,
    /// Stores indexed
    pub store_count: usize,
    /// Longest prefix present
    pub max_depth: usize,
    /// Configured index precision
    pub precision: usize,
}

/// Prefix tree over geohash-encoded store locations.
///
/// Each node represents one geohash prefix and counts the stores below it.
/// A store is attached to the node at depth `min(precision, geohash.len())`.
///
/// Insert and remove walk a single root-to-terminal path, so both are
/// O(precision) regardless of how many stores are indexed.
///
/// # Examples
///
/// ```rust
/// use geocluster::{GeohashTree, StoreRef};
///
/// let mut tree = GeohashTree::new(6);
/// tree.insert(&StoreRef::new("9q8yyk8yu", "sf-1")).unwrap();
/// tree.insert(&StoreRef::new("9q8yyk8yv", "sf-2")).unwrap();
///
/// assert_eq!(tree.store_count(), 2);
/// assert_eq!(tree.get_stores_in_geohash("9q8y").len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeohashTree {
    root: GeohashNode,
    precision: usize,
}

impl GeohashTree {
    /// Create an empty tree.
    ///
    /// # Panics
    ///
    /// Panics if precision is not in range 1-12.
    pub fn new(precision: usize) -> Self {
        assert!(
            (1..=MAX_GEOHASH_PRECISION).contains(&precision),
            "Geohash precision must be between 1 and 12"
        );

        Self {
            root: GeohashNode::new(""),
            precision,
        }
    }

    /// Wrap an already-built root node. Used by snapshot loading.
    pub(crate) fn from_root(root: GeohashNode, precision: usize) -> Self {
        Self { root, precision }
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn root(&self) -> &GeohashNode {
        &self.root
    }

    /// Number of stores in the tree.
    pub fn store_count(&self) -> usize {
        self.root.store_count
    }

    pub fn is_empty(&self) -> bool {
        self.root.store_count == 0
    }

    #[inline]
    fn path_len(&self, geohash: &str) -> usize {
        self.precision.min(geohash.len())
    }

    fn terminal(&self, geohash: &str) -> Option<&GeohashNode> {
        let depth = self.path_len(geohash);
        geohash
            .chars()
            .take(depth)
            .try_fold(&self.root, |node, c| node.child(c))
    }

    /// Whether a store with this key is held at the store's terminal node.
    pub fn contains(&self, store: &StoreRef) -> bool {
        self.terminal(&store.geohash)
            .is_some_and(|node| node.stores().iter().any(|s| s.key == store.key))
    }

    /// Insert a store.
    ///
    /// Returns `Ok(false)` without touching any count when the terminal node
    /// already holds an entry with the same key.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::InvalidGeohash` if the geohash is empty or uses
    /// characters outside the geohash alphabet. The tree is left unchanged.
    pub fn insert(&mut self, store: &StoreRef) -> Result<bool> {
        validate_geohash(&store.geohash)?;

        if self.contains(store) {
            return Ok(false);
        }

        let depth = self.path_len(&store.geohash);
        if depth < self.precision {
            log::warn!(
                "Store '{}' has geohash '{}' shorter than index precision {}",
                store.key,
                store.geohash,
                self.precision
            );
        }

        let mut node = &mut self.root;
        node.store_count += 1;
        for c in store.geohash.chars().take(depth) {
            node = node.child_or_insert(c);
            node.store_count += 1;
        }
        node.stores.get_or_insert_with(Vec::new).push(store.clone());

        Ok(true)
    }

    /// Remove a store by key along its geohash path.
    ///
    /// The key is filtered out of the terminal leaf list, every count on the
    /// path is decremented and nodes left empty are pruned. Returns `false`
    /// and leaves the tree untouched when the key is not at that terminal.
    pub fn remove(&mut self, store: &StoreRef) -> bool {
        if !self.contains(store) {
            return false;
        }

        let depth = self.path_len(&store.geohash);
        let path: Vec<char> = store.geohash.chars().take(depth).collect();
        remove_along(&mut self.root, &path, &store.key);
        true
    }

    /// Bulk insert. Duplicate keys are skipped.
    ///
    /// All geohashes are validated before the first insert, so an invalid
    /// entry leaves the tree unchanged. Returns the number of new stores.
    pub fn build_from_stores(&mut self, stores: &[StoreRef]) -> Result<usize> {
        for store in stores {
            validate_geohash(&store.geohash).map_err(|e| {
                ClusterError::InvalidGeohash(format!("store '{}': {}", store.key, e))
            })?;
        }

        let mut inserted = 0;
        for store in stores {
            if self.insert(store)? {
                inserted += 1;
            }
        }

        log::debug!(
            "Bulk insert of {} stores added {} new entries",
            stores.len(),
            inserted
        );
        Ok(inserted)
    }

    /// Bulk remove. Returns the number of stores actually removed.
    pub fn remove_all(&mut self, stores: &[StoreRef]) -> usize {
        stores.iter().filter(|s| self.remove(s)).count()
    }

    /// Drop every store, keeping the precision.
    pub fn clear(&mut self) {
        self.root = GeohashNode::new("");
    }

    /// All nodes whose effective prefix length equals `level`.
    ///
    /// Level 0 is the root; levels beyond the precision yield nothing.
    pub fn get_nodes_at_level(&self, level: usize) -> Vec<&GeohashNode> {
        let mut nodes = Vec::new();
        self.collect_level(&self.root, level, &mut nodes);
        nodes
    }

    fn collect_level<'a>(&self, node: &'a GeohashNode, level: usize, out: &mut Vec<&'a GeohashNode>) {
        if self.precision.min(node.geohash.len()) == level {
            out.push(node);
            return;
        }
        for (_, child) in node.children() {
            self.collect_level(child, level, out);
        }
    }

    /// All leaf entries under `prefix`.
    ///
    /// The walk stops at the index precision; past that depth leaves are
    /// matched against the remaining prefix characters directly.
    pub fn get_stores_in_geohash(&self, prefix: &str) -> Vec<StoreRef> {
        let depth = self.path_len(prefix);

        let Some(node) = prefix
            .chars()
            .take(depth)
            .try_fold(&self.root, |node, c| node.child(c))
        else {
            return Vec::new();
        };

        let mut stores = node.all_stores();
        if prefix.len() > depth {
            stores.retain(|s| s.geohash.starts_with(prefix));
        }
        stores
    }

    /// Verify the count invariant across the whole tree.
    pub fn validate(&self) -> Result<()> {
        if !self.root.geohash.is_empty() {
            return Err(ClusterError::MalformedSnapshot(format!(
                "root has non-empty prefix '{}'",
                self.root.geohash
            )));
        }
        self.root
            .check_invariants()
            .map_err(ClusterError::MalformedSnapshot)
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            store_count: self.store_count(),
            precision: self.precision,
            ..TreeStats::default()
        };
        accumulate_stats(&self.root, &mut stats);
        stats
    }
}

impl Default for GeohashTree {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

fn remove_along(node: &mut GeohashNode, path: &[char], key: &str) {
    node.store_count = node.store_count.saturating_sub(1);

    match path.split_first() {
        None => {
            if let Some(stores) = node.stores.as_mut() {
                stores.retain(|s| s.key != key);
                if stores.is_empty() {
                    node.stores = None;
                }
            }
        }
        Some((c, rest)) => {
            let prune = match node.children.get_mut(c) {
                Some(child) => {
                    remove_along(child, rest, key);
                    child.store_count == 0
                }
                None => false,
            };
            if prune {
                node.children.remove(c);
            }
        }
    }
}

fn accumulate_stats(node: &GeohashNode, stats: &mut TreeStats) {
    stats.node_count += 1;
    if node.has_stores() {
        stats.leaf_node_count += 1;
    }
    stats.max_depth = stats.max_depth.max(node.geohash.len());
    for (_, child) in node.children() {
        accumulate_stats(child, stats);
    }
}

impl fmt::Display for GeohashTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_node(f: &mut fmt::Formatter<'_>, node: &GeohashNode, level: usize) -> fmt::Result {
            let name = if node.geohash.is_empty() {
                "root"
            } else {
                node.geohash.as_str()
            };
            writeln!(
                f,
                "{}{} ({} stores)",
                "  ".repeat(level),
                name,
                node.store_count
            )?;
            for (_, child) in node.children() {
                write_node(f, child, level + 1)?;
            }
            Ok(())
        }

        write_node(f, &self.root, 0)
    }
}
