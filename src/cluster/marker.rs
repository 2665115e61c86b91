//! Marker payloads returned to the map widget.

use serde::{Deserialize, Serialize};

/// How a marker should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerKind {
    /// A single store at its exact location (street zoom)
    Marker,
    /// A single store shown at reduced precision
    Cluster,
    /// An aggregate of several stores at the zoom's clustering precision
    OptimalCluster,
}

/// One pin on the map. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerData {
    #[serde(rename = "type")]
    pub kind: MarkerKind,
    pub geohash: String,
    pub count: usize,
}

impl MarkerData {
    pub fn new<S: Into<String>>(kind: MarkerKind, geohash: S, count: usize) -> Self {
        Self {
            kind,
            geohash: geohash.into(),
            count,
        }
    }

    pub fn is_exact(&self) -> bool {
        self.kind == MarkerKind::Marker
    }
}
