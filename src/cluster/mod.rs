//! Level-of-detail clustering over the geohash index.

pub mod engine;
pub mod marker;
pub mod policy;

pub use engine::{ClusterQuery, TraversalResult, optimal_cluster_marker, traverse, traverse_from};
pub use marker::{MarkerData, MarkerKind};
pub use policy::{ZOOM_PRECISION_TABLE, viewport_radius_km, zoom_to_precision};
