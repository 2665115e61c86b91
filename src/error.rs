//! Error types for geocluster.

use thiserror::Error;

/// Errors produced by the index, the cluster engine and the locator layer.
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Geohash is empty or contains characters outside the base32 alphabet
    #[error("Invalid geohash: {0}")]
    InvalidGeohash(String),

    /// Zoom level or viewport center could not be used
    #[error("Invalid viewport: {0}")]
    InvalidViewport(String),

    /// Generic argument validation failure
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Persisted tree document is structurally invalid
    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// A write workflow needed an existing tree for the tenant
    #[error("No index found for tenant '{0}'")]
    TenantIndexNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ClusterError {
    /// True when the error originates from a broken persisted document.
    pub fn is_malformed_snapshot(&self) -> bool {
        matches!(self, ClusterError::MalformedSnapshot(_))
    }
}

pub type Result<T> = std::result::Result<T, ClusterError>;
