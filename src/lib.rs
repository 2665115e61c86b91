//! Geohash prefix-tree index and zoom-aware clustering for store locator maps.
//!
//! Store locations are indexed by geohash in a per-tenant prefix tree. A
//! viewport request `(center, zoom)` is answered by walking that tree into a
//! bounded set of point and cluster markers plus the store keys a sidebar
//! result list needs, without ever shipping the full address list.
//!
//! ```rust
//! use geocluster::{ClusterQuery, GeohashTree, LatLng, MarkerKind, StoreRef, traverse};
//!
//! let mut tree = GeohashTree::default();
//! tree.insert(&StoreRef::new("9q8yyk8yu", "sf-market-st"))?;
//!
//! let sf = LatLng::new(37.7749, -122.4194);
//! let result = traverse(tree.root(), &ClusterQuery::for_viewport(14, sf, 1.3));
//!
//! assert_eq!(result.markers.len(), 1);
//! assert_eq!(result.markers[0].kind, MarkerKind::Marker);
//! # Ok::<(), geocluster::ClusterError>(())
//! ```

pub mod builder;
pub mod cluster;
pub mod compute;
pub mod config;
pub mod error;
pub mod index;
pub mod locator;
pub mod storage;
pub mod tenant;

pub use builder::LocatorBuilder;
pub use error::{ClusterError, Result};

pub use cluster::{
    ClusterQuery, MarkerData, MarkerKind, TraversalResult, traverse, viewport_radius_km,
    zoom_to_precision,
};
pub use compute::LatLng;
pub use config::{Config, TruncationPolicy};
pub use index::{GeohashNode, GeohashTree, StoreRef, TreeStats};
pub use locator::{
    InMemoryDirectory, LocatorResponse, MemoryRecorder, NoopRecorder, SearchEvent,
    SearchRecorder, StoreDirectory, StoreLocator, ViewportRequest, truncate,
};
pub use storage::{FileTreeStore, MemoryTreeStore, StoreStats, TreeStore};
pub use tenant::TenantKey;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{ClusterError, Config, LocatorBuilder, Result};

    pub use crate::{GeohashTree, LatLng, StoreRef, TenantKey};

    pub use crate::{ClusterQuery, MarkerData, MarkerKind, traverse, zoom_to_precision};

    pub use crate::{StoreDirectory, StoreLocator, ViewportRequest};

    pub use crate::{FileTreeStore, MemoryTreeStore, TreeStore};

    pub use crate::index::snapshot;
}
