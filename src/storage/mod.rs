//! Tenant-keyed snapshot storage.
//!
//! The locator persists one JSON snapshot per tenant and reloads it on every
//! read. Stores are last-write-wins: concurrent writers for the same tenant
//! must be serialised by the caller.

use crate::error::Result;
use crate::tenant::TenantKey;

mod file;
mod memory;

pub use file::FileTreeStore;
pub use memory::MemoryTreeStore;

/// Trait for snapshot storage implementations
pub trait TreeStore: Send + Sync {
    /// Load the snapshot for a tenant, `None` if the tenant has no tree
    fn load(&self, tenant: &TenantKey) -> Result<Option<String>>;

    /// Insert or replace the snapshot for a tenant
    fn save(&mut self, tenant: &TenantKey, snapshot: &str) -> Result<()>;

    /// Delete a tenant's snapshot, returning whether one existed
    fn delete(&mut self, tenant: &TenantKey) -> Result<bool>;

    /// Check if a tenant has a snapshot
    fn contains(&self, tenant: &TenantKey) -> Result<bool> {
        Ok(self.load(tenant)?.is_some())
    }

    /// All tenants with a stored snapshot, in ascending order
    fn tenants(&self) -> Result<Vec<TenantKey>>;

    /// Get storage statistics
    fn stats(&self) -> StoreStats;
}

/// Snapshot store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of tenants with a snapshot
    pub tenant_count: usize,
    /// Snapshot loads served
    pub loads: u64,
    /// Snapshot writes performed
    pub saves: u64,
}
