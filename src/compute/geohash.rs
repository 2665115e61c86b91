//! Geohash codec used by the index and the cluster engine.
//!
//! Thin wrapper over the `geohash` crate that speaks `(lat, lng)` instead of
//! `(x, y)` and maps failures into [`ClusterError`].

use crate::error::{ClusterError, Result};
use geo::Point;
use serde::{Deserialize, Serialize};

/// Base32 alphabet used by geohash strings.
pub const GEOHASH_ALPHABET: &str = "0123456789bcdefghjkmnpqrstuvwxyz";

/// Longest geohash the codec produces.
pub const MAX_GEOHASH_PRECISION: usize = 12;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Convert into a `geo::Point` (x = longitude, y = latitude).
    pub fn to_point(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

impl From<LatLng> for Point<f64> {
    fn from(value: LatLng) -> Self {
        value.to_point()
    }
}

impl From<Point<f64>> for LatLng {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

/// Returns true if `c` belongs to the geohash alphabet.
#[inline]
pub fn is_geohash_char(c: char) -> bool {
    GEOHASH_ALPHABET.contains(c)
}

/// Returns true if `hash` is non-empty and made only of geohash characters.
pub fn is_valid_geohash(hash: &str) -> bool {
    !hash.is_empty() && hash.chars().all(is_geohash_char)
}

/// Encode a coordinate into a geohash of `precision` characters.
///
/// # Examples
///
/// ```
/// use geocluster::compute::geohash::encode;
///
/// let hash = encode(37.7749, -122.4194, 5).unwrap();
/// assert_eq!(hash, "9q8yy");
/// ```
pub fn encode(lat: f64, lng: f64, precision: usize) -> Result<String> {
    if !(1..=MAX_GEOHASH_PRECISION).contains(&precision) {
        return Err(ClusterError::InvalidInput(format!(
            "Geohash precision must be between 1 and {}, got: {}",
            MAX_GEOHASH_PRECISION, precision
        )));
    }

    let coord = geohash::Coord { x: lng, y: lat };
    geohash::encode(coord, precision)
        .map_err(|e| ClusterError::InvalidInput(format!("Cannot encode ({lat}, {lng}): {e}")))
}

/// Decode a geohash into the center of its cell.
pub fn decode(hash: &str) -> Result<LatLng> {
    if !is_valid_geohash(hash) {
        return Err(ClusterError::InvalidGeohash(hash.to_string()));
    }

    let (center, _, _) =
        geohash::decode(hash).map_err(|e| ClusterError::InvalidGeohash(format!("{hash}: {e}")))?;

    Ok(LatLng::new(center.y, center.x))
}
