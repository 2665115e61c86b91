//! Geometry primitives: geohash codec, distance and input validation.

pub mod distance;
pub mod geohash;
pub mod validation;

pub use distance::{haversine_km, is_within_radius};
pub use geohash::{LatLng, decode, encode, is_valid_geohash};
