//! Store locator: the viewport query path and the tenant write workflows.
//!
//! Reads are stateless. Every query loads the tenant snapshot, deserializes a
//! fresh tree, clusters it for the viewport, applies the anti-scraping caps
//! and asks the [`StoreDirectory`] for the details of the surviving keys.
//!
//! Writes (`import_stores`, `remove_stores`, `update_store`) load the
//! snapshot, mutate the tree and persist the re-serialized document. They
//! take `&mut self`; callers sharing a store across processes must serialise
//! writes per tenant themselves.

use crate::cluster::{ClusterQuery, MarkerData, MarkerKind, TraversalResult, traverse};
use crate::compute::geohash::LatLng;
use crate::compute::validation::{
    parse_center, parse_zoom, validate_center, validate_geohash, validate_zoom,
};
use crate::config::{Config, TruncationPolicy};
use crate::error::{ClusterError, Result};
use crate::index::{GeohashTree, StoreRef, snapshot};
use crate::storage::TreeStore;
use crate::tenant::TenantKey;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// External lookup of store details for the keys a query returns.
pub trait StoreDirectory {
    type Store;

    /// Fetch details for `keys`, in the given order. Unknown keys are skipped.
    fn fetch_by_keys(&self, tenant: &TenantKey, keys: &[StoreRef]) -> Result<Vec<Self::Store>>;
}

/// A free-text search submitted alongside a viewport request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchEvent {
    pub tenant: TenantKey,
    pub term: String,
    pub center: LatLng,
}

/// External analytics sink for search terms. Never consulted by the index.
pub trait SearchRecorder: Send + Sync {
    fn record(&self, event: &SearchEvent);
}

impl<R: SearchRecorder + ?Sized> SearchRecorder for std::sync::Arc<R> {
    fn record(&self, event: &SearchEvent) {
        (**self).record(event);
    }
}

/// Recorder that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRecorder;

impl SearchRecorder for NoopRecorder {
    fn record(&self, _event: &SearchEvent) {}
}

/// Recorder that keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<SearchEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SearchEvent> {
        self.events.lock().clone()
    }
}

impl SearchRecorder for MemoryRecorder {
    fn record(&self, event: &SearchEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Store details kept in memory, keyed by tenant and store key.
#[derive(Debug, Clone)]
pub struct InMemoryDirectory<T> {
    stores: FxHashMap<TenantKey, FxHashMap<String, T>>,
}

impl<T> InMemoryDirectory<T> {
    pub fn new() -> Self {
        Self {
            stores: FxHashMap::default(),
        }
    }

    pub fn insert<K: Into<String>>(&mut self, tenant: &TenantKey, key: K, details: T) {
        self.stores
            .entry(tenant.clone())
            .or_default()
            .insert(key.into(), details);
    }

    pub fn remove(&mut self, tenant: &TenantKey, key: &str) -> Option<T> {
        self.stores.get_mut(tenant).and_then(|s| s.remove(key))
    }
}

impl<T> Default for InMemoryDirectory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> StoreDirectory for InMemoryDirectory<T> {
    type Store = T;

    fn fetch_by_keys(&self, tenant: &TenantKey, keys: &[StoreRef]) -> Result<Vec<T>> {
        let Some(stores) = self.stores.get(tenant) else {
            return Ok(Vec::new());
        };
        Ok(keys
            .iter()
            .filter_map(|k| stores.get(&k.key).cloned())
            .collect())
    }
}

/// A validated viewport request.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportRequest {
    pub tenant: TenantKey,
    pub zoom: u8,
    pub center: LatLng,
    pub search: Option<String>,
}

impl ViewportRequest {
    pub fn new(tenant: TenantKey, zoom: u8, center: LatLng) -> Self {
        Self {
            tenant,
            zoom,
            center,
            search: None,
        }
    }

    pub fn with_search<S: Into<String>>(mut self, term: S) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Build a request from raw query-string values.
    ///
    /// `center` is `"lat,lng"`; `zoom` must be an integer no larger than
    /// `max_zoom`.
    pub fn parse(
        tenant: &str,
        zoom: &str,
        center: &str,
        search: Option<&str>,
        max_zoom: u8,
    ) -> Result<Self> {
        Ok(Self {
            tenant: TenantKey::parse(tenant)?,
            zoom: parse_zoom(zoom, max_zoom)?,
            center: parse_center(center)?,
            search: search.map(str::to_string),
        })
    }
}

/// Response body for the map widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocatorResponse<T> {
    pub markers_data: Vec<MarkerData>,
    pub stores: Vec<T>,
}

impl<T> LocatorResponse<T> {
    pub fn empty() -> Self {
        Self {
            markers_data: Vec::new(),
            stores: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers_data.is_empty() && self.stores.is_empty()
    }
}

/// Apply the response caps to a complete traversal result.
///
/// Exact-marker results (street zoom) are cut to `max_street_markers`; the
/// key list is cut to `max_result_keys` below `full_results_zoom`.
pub fn truncate(mut result: TraversalResult, zoom: u8, policy: &TruncationPolicy) -> TraversalResult {
    if result
        .markers
        .first()
        .is_some_and(|m| m.kind == MarkerKind::Marker)
    {
        result.markers.truncate(policy.max_street_markers);
    }

    if zoom < policy.full_results_zoom {
        result.keys_to_fetch.truncate(policy.max_result_keys);
    }

    result
}

/// Viewport queries and write workflows over a [`TreeStore`].
pub struct StoreLocator<S, D> {
    config: Config,
    store: S,
    directory: D,
    recorder: Box<dyn SearchRecorder>,
}

impl<S: TreeStore, D: StoreDirectory> StoreLocator<S, D> {
    /// Create a locator with the default configuration.
    pub fn new(store: S, directory: D) -> Self {
        Self {
            config: Config::default(),
            store,
            directory,
            recorder: Box::new(NoopRecorder),
        }
    }

    pub(crate) fn from_parts(
        config: Config,
        store: S,
        directory: D,
        recorder: Box<dyn SearchRecorder>,
    ) -> Self {
        Self {
            config,
            store,
            directory,
            recorder,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    /// Answer a viewport request.
    ///
    /// Tenants without a tree, empty trees and unreadable snapshots all yield
    /// an empty response; only invalid input and storage failures are errors.
    pub fn query(&self, request: &ViewportRequest) -> Result<LocatorResponse<D::Store>> {
        validate_zoom(request.zoom, self.config.max_zoom)?;
        validate_center(&request.center)?;

        if let Some(term) = request.search.as_deref().map(str::trim)
            && !term.is_empty()
        {
            self.recorder.record(&SearchEvent {
                tenant: request.tenant.clone(),
                term: term.to_string(),
                center: request.center,
            });
        }

        let result = self.cluster(&request.tenant, request.zoom, request.center)?;
        if result.is_empty() {
            return Ok(LocatorResponse::empty());
        }

        let result = truncate(result, request.zoom, &self.config.truncation);
        let stores = self
            .directory
            .fetch_by_keys(&request.tenant, &result.keys_to_fetch)?;

        Ok(LocatorResponse {
            markers_data: result.markers,
            stores,
        })
    }

    /// Complete, untruncated traversal for a tenant's viewport.
    pub fn cluster(&self, tenant: &TenantKey, zoom: u8, center: LatLng) -> Result<TraversalResult> {
        let Some(tree) = self.load_for_read(tenant)? else {
            return Ok(TraversalResult::default());
        };

        if tree.is_empty() {
            return Ok(TraversalResult::default());
        }

        let query = ClusterQuery::for_viewport(zoom, center, self.config.radius_padding);
        Ok(traverse(tree.root(), &query))
    }

    /// Load a tenant's tree, if any.
    pub fn tree(&self, tenant: &TenantKey) -> Result<Option<GeohashTree>> {
        match self.store.load(tenant)? {
            Some(data) => Ok(Some(snapshot::deserialize(&data, self.config.precision)?)),
            None => Ok(None),
        }
    }

    fn load_for_read(&self, tenant: &TenantKey) -> Result<Option<GeohashTree>> {
        match self.tree(tenant) {
            Err(e) if e.is_malformed_snapshot() => {
                log::error!("Snapshot for tenant '{}' is unreadable: {}", tenant, e);
                Ok(None)
            }
            other => other,
        }
    }

    fn persist(&mut self, tenant: &TenantKey, tree: &GeohashTree) -> Result<()> {
        let data = snapshot::serialize(tree)?;
        self.store.save(tenant, &data)
    }

    /// Add validated stores to a tenant's tree, creating the tree if needed.
    ///
    /// Returns the number of stores that were not already indexed.
    pub fn import_stores(&mut self, tenant: &TenantKey, stores: &[StoreRef]) -> Result<usize> {
        let mut tree = self
            .tree(tenant)?
            .unwrap_or_else(|| GeohashTree::new(self.config.precision));

        let inserted = tree.build_from_stores(stores)?;
        self.persist(tenant, &tree)?;

        log::debug!(
            "Imported {} of {} stores for tenant '{}' ({} total)",
            inserted,
            stores.len(),
            tenant,
            tree.store_count()
        );
        Ok(inserted)
    }

    /// Remove stores from a tenant's tree. Returns how many were present.
    ///
    /// # Errors
    ///
    /// Returns `ClusterError::TenantIndexNotFound` if the tenant has no tree.
    pub fn remove_stores(&mut self, tenant: &TenantKey, stores: &[StoreRef]) -> Result<usize> {
        let mut tree = self.require_tree(tenant)?;

        let removed = tree.remove_all(stores);
        if removed < stores.len() {
            log::warn!(
                "{} of {} stores to remove were not indexed for tenant '{}'",
                stores.len() - removed,
                stores.len(),
                tenant
            );
        }

        self.persist(tenant, &tree)?;
        Ok(removed)
    }

    /// Move a store to a new location or key in one write.
    ///
    /// Returns whether `old` was indexed. `new` is validated before anything
    /// is removed.
    pub fn update_store(&mut self, tenant: &TenantKey, old: &StoreRef, new: &StoreRef) -> Result<bool> {
        validate_geohash(&new.geohash)?;
        let mut tree = self.require_tree(tenant)?;

        let existed = tree.remove(old);
        tree.insert(new)?;
        self.persist(tenant, &tree)?;
        Ok(existed)
    }

    /// Drop a tenant's tree entirely.
    pub fn delete_tenant(&mut self, tenant: &TenantKey) -> Result<bool> {
        self.store.delete(tenant)
    }

    fn require_tree(&self, tenant: &TenantKey) -> Result<GeohashTree> {
        self.tree(tenant)?.ok_or_else(|| {
            log::warn!("Write for tenant '{}' found no tree", tenant);
            ClusterError::TenantIndexNotFound(tenant.to_string())
        })
    }
}
