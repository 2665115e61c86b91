//! Zoom level to clustering precision policy.
//!
//! Longer geohash prefixes denote smaller cells, so wide low-zoom views
//! cluster on short prefixes and street-level views resolve individual
//! addresses. The table is data; retune it here without touching traversal.

/// Mean equatorial circumference of the Earth in kilometres.
pub const EARTH_CIRCUMFERENCE_KM: f64 = 40_075.0;

/// `(minimum zoom, target precision)` rows, highest zoom first.
///
/// A zoom level maps to the precision of the first row whose minimum it meets.
pub const ZOOM_PRECISION_TABLE: &[(u8, usize)] = &[
    (12, 9),
    (11, 5),
    (9, 4),
    (6, 3),
    (3, 2),
    (0, 1),
];

/// Atomic clustering precision for a zoom level.
///
/// # Examples
///
/// ```
/// use geocluster::cluster::zoom_to_precision;
///
/// assert_eq!(zoom_to_precision(14), 9);
/// assert_eq!(zoom_to_precision(9), 4);
/// assert_eq!(zoom_to_precision(0), 1);
/// ```
pub fn zoom_to_precision(zoom: u8) -> usize {
    ZOOM_PRECISION_TABLE
        .iter()
        .find(|(min_zoom, _)| zoom >= *min_zoom)
        .map(|(_, precision)| *precision)
        .unwrap_or(1)
}

/// Coarse inclusion radius for a viewport at `zoom`, in kilometres.
///
/// The visible width of a tile at zoom `z` is roughly the Earth's
/// circumference over `2^z`; `padding` widens it so markers near the edges are
/// kept. The estimate is deliberately loose so responses do not reveal an
/// exact bounding rectangle.
pub fn viewport_radius_km(zoom: u8, padding: f64) -> f64 {
    EARTH_CIRCUMFERENCE_KM / 2f64.powi(i32::from(zoom)) * padding
}
