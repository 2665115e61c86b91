//! Cluster query engine.
//!
//! Walks the prefix tree (not the plane) and turns it into map markers for a
//! viewport:
//!
//! - a subtree holding exactly one store becomes a single point, however deep
//!   that store sits, so chains of single-occupant nodes never produce
//!   intermediate cluster pins;
//! - a subtree whose prefix length reaches the target precision becomes one
//!   `optimal-cluster` marker carrying the subtree's total count;
//! - anything else is descended into.
//!
//! Every marker is bounds-tested with a haversine distance against the
//! caller's coarse viewport radius. The engine returns the complete in-bounds
//! result; truncation is left to the caller.

use super::marker::{MarkerData, MarkerKind};
use super::policy::{viewport_radius_km, zoom_to_precision};
use crate::compute::distance::is_within_radius;
use crate::compute::geohash::{LatLng, decode};
use crate::index::node::{GeohashNode, StoreRef};
use serde::Serialize;

/// Geohash length used for isolated stores below exact-marker zoom.
pub const ISOLATED_STORE_PRECISION: usize = 7;

/// Zoom levels above this value show isolated stores as exact markers.
pub const EXACT_MARKER_ZOOM_THRESHOLD: u8 = 12;

/// Parameters of one viewport traversal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClusterQuery {
    /// Prefix length at which subtrees collapse into a cluster
    pub target_precision: usize,
    /// Map zoom level
    pub zoom: u8,
    /// Viewport center
    pub center: LatLng,
    /// Inclusion radius around `center`, in kilometres
    pub radius_km: f64,
}

impl ClusterQuery {
    pub fn new(target_precision: usize, zoom: u8, center: LatLng, radius_km: f64) -> Self {
        Self {
            target_precision,
            zoom,
            center,
            radius_km,
        }
    }

    /// Derive target precision and radius from the zoom level.
    pub fn for_viewport(zoom: u8, center: LatLng, radius_padding: f64) -> Self {
        Self::new(
            zoom_to_precision(zoom),
            zoom,
            center,
            viewport_radius_km(zoom, radius_padding),
        )
    }

    #[inline]
    fn contains(&self, position: LatLng) -> bool {
        is_within_radius(position, self.center, self.radius_km)
    }
}

/// Markers plus the store references a result list would need.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraversalResult {
    pub markers: Vec<MarkerData>,
    pub keys_to_fetch: Vec<StoreRef>,
}

impl TraversalResult {
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty() && self.keys_to_fetch.is_empty()
    }

    /// Merge another branch's output into this one.
    pub fn extend(&mut self, other: TraversalResult) {
        self.markers.extend(other.markers);
        self.keys_to_fetch.extend(other.keys_to_fetch);
    }
}

/// Walk `node` and emit markers for the viewport described by `query`.
///
/// `node` is normally the tree root. Its own prefix is used as the starting
/// prefix.
pub fn traverse(node: &GeohashNode, query: &ClusterQuery) -> TraversalResult {
    let mut result = TraversalResult::default();
    let mut prefix = node.geohash().to_string();
    visit(node, &mut prefix, query, &mut result);

    log::debug!(
        "Traversal at zoom {} (precision {}, radius {:.2} km) produced {} markers, {} keys",
        query.zoom,
        query.target_precision,
        query.radius_km,
        result.markers.len(),
        result.keys_to_fetch.len()
    );
    result
}

/// Positional form of [`traverse`] with an explicit starting prefix.
pub fn traverse_from(
    node: &GeohashNode,
    target_precision: usize,
    prefix: &str,
    zoom: u8,
    center: LatLng,
    radius_km: f64,
) -> TraversalResult {
    let query = ClusterQuery::new(target_precision, zoom, center, radius_km);
    let mut result = TraversalResult::default();
    let mut prefix = prefix.to_string();
    visit(node, &mut prefix, &query, &mut result);
    result
}

fn visit(node: &GeohashNode, prefix: &mut String, query: &ClusterQuery, out: &mut TraversalResult) {
    if node.store_count() == 0 {
        return;
    }

    if node.store_count() == 1 && node.has_stores() {
        emit_point(&node.stores()[0], query, out);
        return;
    }

    // Terminal cells shared by several stores; only reached when the target
    // precision is finer than the index precision.
    if node.has_stores() {
        emit_shared_cell(node.stores(), query, out);
    }

    for (c, child) in node.children() {
        if child.store_count() == 0 {
            continue;
        }

        prefix.push(c);
        if child.store_count() == 1 {
            visit(child, prefix, query, out);
        } else if prefix.len() == query.target_precision {
            emit_cluster(child, prefix, query, out);
        } else {
            visit(child, prefix, query, out);
        }
        prefix.pop();
    }
}

fn in_bounds(leaf: &StoreRef, query: &ClusterQuery) -> bool {
    match decode(&leaf.geohash) {
        Ok(position) => query.contains(position),
        Err(e) => {
            log::warn!("Skipping store '{}': {}", leaf.key, e);
            false
        }
    }
}

fn isolated_geohash(geohash: &str) -> String {
    geohash.chars().take(ISOLATED_STORE_PRECISION).collect()
}

fn emit_point(leaf: &StoreRef, query: &ClusterQuery, out: &mut TraversalResult) {
    if !in_bounds(leaf, query) {
        return;
    }

    let marker = if query.zoom > EXACT_MARKER_ZOOM_THRESHOLD {
        MarkerData::new(MarkerKind::Marker, leaf.geohash.as_str(), 1)
    } else {
        MarkerData::new(MarkerKind::Cluster, isolated_geohash(&leaf.geohash), 1)
    };

    out.markers.push(marker);
    out.keys_to_fetch.push(leaf.clone());
}

/// Leaves of one terminal cell. Above exact-marker zoom each store is its
/// own pin; below it, stores sharing a truncated geohash share one pin whose
/// count is the group size.
fn emit_shared_cell(leaves: &[StoreRef], query: &ClusterQuery, out: &mut TraversalResult) {
    if query.zoom > EXACT_MARKER_ZOOM_THRESHOLD {
        for leaf in leaves {
            emit_point(leaf, query, out);
        }
        return;
    }

    let mut groups: Vec<MarkerData> = Vec::new();
    for leaf in leaves.iter().filter(|leaf| in_bounds(leaf, query)) {
        let geohash = isolated_geohash(&leaf.geohash);
        match groups.iter_mut().find(|m| m.geohash == geohash) {
            Some(marker) => marker.count += 1,
            None => groups.push(MarkerData::new(MarkerKind::Cluster, geohash, 1)),
        }
        out.keys_to_fetch.push(leaf.clone());
    }
    out.markers.extend(groups);
}

fn emit_cluster(node: &GeohashNode, prefix: &str, query: &ClusterQuery, out: &mut TraversalResult) {
    let Ok(cell_center) = decode(prefix) else {
        return;
    };

    if !query.contains(cell_center) {
        return;
    }

    out.markers.push(optimal_cluster_marker(prefix, node));
    node.collect_stores(&mut out.keys_to_fetch);
}

/// Cluster marker for `node`, anchored on its densest direct child.
///
/// The child with the largest count wins (first one on ties); when that count
/// exceeds 1 the pin moves to the child's prefix, otherwise it stays on the
/// cluster's own prefix. The count is always the cluster total.
pub fn optimal_cluster_marker(prefix: &str, node: &GeohashNode) -> MarkerData {
    let mut densest: Option<(char, usize)> = None;
    for (c, child) in node.children() {
        if child.store_count() > densest.map_or(0, |(_, count)| count) {
            densest = Some((c, child.store_count()));
        }
    }

    let geohash = match densest {
        Some((c, count)) if count > 1 => format!("{prefix}{c}"),
        _ => prefix.to_string(),
    };

    MarkerData::new(MarkerKind::OptimalCluster, geohash, node.store_count())
}
