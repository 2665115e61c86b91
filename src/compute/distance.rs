//! Great-circle distance for viewport bounds tests.

use super::geohash::LatLng;
use geo::{Distance, Haversine};

/// Haversine distance between two coordinates, in kilometres.
pub fn haversine_km(a: LatLng, b: LatLng) -> f64 {
    Haversine.distance(a.to_point(), b.to_point()) / 1000.0
}

/// Whether `position` lies within `radius_km` of `center`.
#[inline]
pub fn is_within_radius(position: LatLng, center: LatLng, radius_km: f64) -> bool {
    haversine_km(center, position) <= radius_km
}
