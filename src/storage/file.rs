//! Directory-backed snapshot store: one `<tenant>.json` file per tenant.
//!
//! Writes go to a temporary file that is fsynced and renamed over the old
//! snapshot, so readers see either the previous or the new document.

use super::{StoreStats, TreeStore};
use crate::error::Result;
use crate::tenant::TenantKey;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const SNAPSHOT_EXTENSION: &str = "json";

pub struct FileTreeStore {
    dir: PathBuf,
    loads: AtomicU64,
    saves: u64,
}

impl FileTreeStore {
    /// Open (creating if needed) a snapshot directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            loads: AtomicU64::new(0),
            saves: 0,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, tenant: &TenantKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}", tenant.as_str(), SNAPSHOT_EXTENSION))
    }

    fn temp_path(&self, tenant: &TenantKey) -> PathBuf {
        self.dir
            .join(format!("{}.{}.tmp", tenant.as_str(), SNAPSHOT_EXTENSION))
    }

    fn sync_dir(&self) -> Result<()> {
        let dir = File::open(&self.dir)?;
        dir.sync_all()?;
        Ok(())
    }
}

impl TreeStore for FileTreeStore {
    fn load(&self, tenant: &TenantKey) -> Result<Option<String>> {
        self.loads.fetch_add(1, Ordering::Relaxed);

        match fs::read_to_string(self.snapshot_path(tenant)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, tenant: &TenantKey, snapshot: &str) -> Result<()> {
        let temp_path = self.temp_path(tenant);

        let written = write_synced(&temp_path, snapshot)
            .and_then(|()| Ok(fs::rename(&temp_path, self.snapshot_path(tenant))?));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path)
                && cleanup.kind() != ErrorKind::NotFound
            {
                log::warn!(
                    "Failed to remove temporary snapshot {}: {}",
                    temp_path.display(),
                    cleanup
                );
            }
            return Err(e);
        }
        self.sync_dir()?;

        self.saves += 1;
        log::debug!("Saved snapshot for tenant '{}' ({} bytes)", tenant, snapshot.len());
        Ok(())
    }

    fn delete(&mut self, tenant: &TenantKey) -> Result<bool> {
        match fs::remove_file(self.snapshot_path(tenant)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn contains(&self, tenant: &TenantKey) -> Result<bool> {
        Ok(self.snapshot_path(tenant).is_file())
    }

    fn tenants(&self) -> Result<Vec<TenantKey>> {
        let mut tenants = Vec::new();

        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match TenantKey::parse(stem) {
                Ok(tenant) => tenants.push(tenant),
                Err(e) => log::warn!("Ignoring snapshot file {}: {}", path.display(), e),
            }
        }

        tenants.sort();
        Ok(tenants)
    }

    fn stats(&self) -> StoreStats {
        let tenant_count = match self.tenants() {
            Ok(tenants) => tenants.len(),
            Err(e) => {
                log::warn!("Failed to list snapshots in {}: {}", self.dir.display(), e);
                0
            }
        };

        StoreStats {
            tenant_count,
            loads: self.loads.load(Ordering::Relaxed),
            saves: self.saves,
        }
    }
}

fn write_synced(path: &Path, contents: &str) -> Result<()> {
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;

    let mut writer = BufWriter::new(file);
    writer.write_all(contents.as_bytes())?;
    writer.flush()?;
    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    Ok(())
}
