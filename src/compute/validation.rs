//! Validation for viewport input and store references.
//!
//! The cluster engine assumes well-formed numeric input; everything that
//! arrives from a request goes through here first.

use super::geohash::{GEOHASH_ALPHABET, LatLng};
use crate::error::{ClusterError, Result};

/// Validates a viewport center has finite, in-range latitude and longitude.
///
/// Longitude: [-180.0, 180.0], Latitude: [-90.0, 90.0]
///
/// # Examples
///
/// ```
/// use geocluster::compute::validation::validate_center;
/// use geocluster::LatLng;
///
/// assert!(validate_center(&LatLng::new(37.77, -122.42)).is_ok());
/// assert!(validate_center(&LatLng::new(95.0, 0.0)).is_err());
/// assert!(validate_center(&LatLng::new(0.0, f64::NAN)).is_err());
/// ```
pub fn validate_center(center: &LatLng) -> Result<()> {
    let LatLng { lat, lng } = *center;

    if !lat.is_finite() {
        return Err(ClusterError::InvalidViewport(format!(
            "Latitude must be finite, got: {}",
            lat
        )));
    }

    if !lng.is_finite() {
        return Err(ClusterError::InvalidViewport(format!(
            "Longitude must be finite, got: {}",
            lng
        )));
    }

    if !(-90.0..=90.0).contains(&lat) {
        return Err(ClusterError::InvalidViewport(format!(
            "Latitude out of range [-90.0, 90.0]: {}",
            lat
        )));
    }

    if !(-180.0..=180.0).contains(&lng) {
        return Err(ClusterError::InvalidViewport(format!(
            "Longitude out of range [-180.0, 180.0]: {}",
            lng
        )));
    }

    Ok(())
}

/// Validates a zoom level does not exceed `max_zoom`.
pub fn validate_zoom(zoom: u8, max_zoom: u8) -> Result<()> {
    if zoom > max_zoom {
        return Err(ClusterError::InvalidViewport(format!(
            "Zoom must be between 0 and {}, got: {}",
            max_zoom, zoom
        )));
    }
    Ok(())
}

/// Validates a geohash is non-empty and uses only the base32 geohash alphabet.
pub fn validate_geohash(hash: &str) -> Result<()> {
    if hash.is_empty() {
        return Err(ClusterError::InvalidGeohash(
            "Geohash cannot be empty".into(),
        ));
    }

    if let Some(bad) = hash.chars().find(|c| !GEOHASH_ALPHABET.contains(*c)) {
        return Err(ClusterError::InvalidGeohash(format!(
            "'{}' contains invalid character '{}'",
            hash, bad
        )));
    }

    Ok(())
}

/// Parses a `"lat,lng"` pair as sent by the map widget.
pub fn parse_center(raw: &str) -> Result<LatLng> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(ClusterError::InvalidViewport(format!(
            "Center must be 'lat,lng', got: '{}'",
            raw
        )));
    }

    let parse = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| ClusterError::InvalidViewport(format!("Not a number: '{}'", s)))
    };

    let center = LatLng::new(parse(parts[0])?, parse(parts[1])?);
    validate_center(&center)?;
    Ok(center)
}

/// Parses an integer zoom level.
pub fn parse_zoom(raw: &str, max_zoom: u8) -> Result<u8> {
    let zoom = raw
        .trim()
        .parse::<u8>()
        .map_err(|_| ClusterError::InvalidViewport(format!("Zoom must be an integer, got: '{}'", raw)))?;
    validate_zoom(zoom, max_zoom)?;
    Ok(zoom)
}
