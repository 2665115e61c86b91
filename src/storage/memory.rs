//! In-memory snapshot store.

use super::{StoreStats, TreeStore};
use crate::error::Result;
use crate::tenant::TenantKey;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory snapshot store using HashMap
#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    data: FxHashMap<TenantKey, String>,
    loads: AtomicU64,
    saves: u64,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw snapshot access without counting a load.
    pub fn get(&self, tenant: &TenantKey) -> Option<&str> {
        self.data.get(tenant).map(String::as_str)
    }
}

impl TreeStore for MemoryTreeStore {
    fn load(&self, tenant: &TenantKey) -> Result<Option<String>> {
        self.loads.fetch_add(1, Ordering::Relaxed);
        Ok(self.data.get(tenant).cloned())
    }

    fn save(&mut self, tenant: &TenantKey, snapshot: &str) -> Result<()> {
        self.data.insert(tenant.clone(), snapshot.to_string());
        self.saves += 1;
        Ok(())
    }

    fn delete(&mut self, tenant: &TenantKey) -> Result<bool> {
        Ok(self.data.remove(tenant).is_some())
    }

    fn contains(&self, tenant: &TenantKey) -> Result<bool> {
        Ok(self.data.contains_key(tenant))
    }

    fn tenants(&self) -> Result<Vec<TenantKey>> {
        let mut tenants: Vec<_> = self.data.keys().cloned().collect();
        tenants.sort();
        Ok(tenants)
    }

    fn stats(&self) -> StoreStats {
        StoreStats {
            tenant_count: self.data.len(),
            loads: self.loads.load(Ordering::Relaxed),
            saves: self.saves,
        }
    }
}
