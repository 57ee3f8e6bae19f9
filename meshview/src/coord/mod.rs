//! Coordinate conversion module
//!
//! Provides conversions between geographic coordinates (latitude/longitude)
//! and Web Mercator world-pixel coordinates used by the map tiles and the
//! animation layer.
//!
//! World pixels are tile coordinates scaled by [`TILE_SIZE`]: at zoom `z` the
//! whole world spans `256 · 2^z` pixels in each direction, with the origin at
//! the north-west corner.

mod types;
mod viewport;

pub use types::{GeoPoint, TileKey, WorldPoint};
pub use viewport::{
    Viewport, DEFAULT_CENTER_LAT, DEFAULT_CENTER_LON, DEFAULT_HEIGHT, DEFAULT_WIDTH,
    SELECTION_RADIUS_PX,
};

use std::f64::consts::PI;

/// Edge length of a map tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// Zoom level used for the map view and for projecting animation endpoints.
pub const DEFAULT_ZOOM: u8 = 10;

/// Maximum zoom level served by the public tile source.
pub const MAX_ZOOM: u8 = 19;

/// Limits a zoom level to the range the tile source serves.
///
/// Every projection helper and [`Viewport`] clamp through this, so world
/// pixels and tile keys always agree on the grid size.
#[inline]
pub fn clamp_zoom(zoom: u8) -> u8 {
    zoom.min(MAX_ZOOM)
}

/// Converts geographic coordinates to fractional tile coordinates.
///
/// Uses the spherical Web Mercator formulas:
///
/// * `x = (lon + 180) / 360 · 2^zoom`
/// * `y = (1 − ln(tan φ + sec φ) / π) / 2 · 2^zoom`
///
/// No range validation happens here; callers pass positions that already
/// passed [`GeoPoint::from_parts`].
#[inline]
pub fn to_tile_fraction(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom) as f64;
    let lat_rad = lat.to_radians();

    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    (x, y)
}

/// Projects geographic coordinates to world-pixel coordinates.
///
/// # Arguments
///
/// * `lat` - Latitude in degrees
/// * `lon` - Longitude in degrees
/// * `zoom` - Zoom level
#[inline]
pub fn project(lat: f64, lon: f64, zoom: u8) -> WorldPoint {
    let (x, y) = to_tile_fraction(lat, lon, zoom);
    let size = TILE_SIZE as f64;
    WorldPoint::new(x * size, y * size)
}

/// Projects a [`GeoPoint`] to world-pixel coordinates.
#[inline]
pub fn project_point(point: GeoPoint, zoom: u8) -> WorldPoint {
    project(point.lat, point.lon, zoom)
}

/// Converts world-pixel coordinates back to geographic coordinates.
///
/// Inverse of [`project`] at the same zoom level.
///
/// # Returns
///
/// A tuple of (latitude, longitude) in degrees.
#[inline]
pub fn unproject(point: WorldPoint, zoom: u8) -> (f64, f64) {
    let n = tiles_per_axis(zoom) as f64;
    let size = TILE_SIZE as f64;

    let lon = point.x / size / n * 360.0 - 180.0;

    // Inverse Web Mercator
    let y = point.y / size / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();

    (lat, lon)
}

/// Number of tiles along one axis at the given zoom level (clamped).
#[inline]
pub fn tiles_per_axis(zoom: u8) -> u32 {
    1u32 << clamp_zoom(zoom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_at_zoom_zero() {
        // Null Island sits in the middle of the single zoom-0 tile
        let point = project(0.0, 0.0, 0);
        assert!((point.x - 128.0).abs() < 1e-9);
        assert!((point.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_is_left_edge() {
        let point = project(0.0, -180.0, DEFAULT_ZOOM);
        assert!(point.x.abs() < 1e-9);
    }

    #[test]
    fn test_moscow_tile_at_zoom_10() {
        // Moscow center lands in tile 619/320 at zoom 10
        let (x, y) = to_tile_fraction(55.7558, 37.6176, 10);
        assert_eq!(x.floor() as u32, 619);
        assert_eq!(y.floor() as u32, 320);
    }

    #[test]
    fn test_north_is_up() {
        let north = project(60.0, 30.0, DEFAULT_ZOOM);
        let south = project(50.0, 30.0, DEFAULT_ZOOM);
        assert!(north.y < south.y, "Higher latitude should have smaller y");
    }

    #[test]
    fn test_zoom_doubles_pixels() {
        let low = project(48.8566, 2.3522, 9);
        let high = project(48.8566, 2.3522, 10);
        assert!((high.x - low.x * 2.0).abs() < 1e-6);
        assert!((high.y - low.y * 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let (lat, lon) = unproject(project(55.0, 37.0, DEFAULT_ZOOM), DEFAULT_ZOOM);
        assert!((lat - 55.0).abs() < 1e-9, "Latitude should roundtrip");
        assert!((lon - 37.0).abs() < 1e-9, "Longitude should roundtrip");
    }

    #[test]
    fn test_tiles_per_axis() {
        assert_eq!(tiles_per_axis(0), 1);
        assert_eq!(tiles_per_axis(10), 1024);
    }

    #[test]
    fn test_zoom_above_max_is_clamped_everywhere() {
        assert_eq!(clamp_zoom(25), MAX_ZOOM);
        assert_eq!(tiles_per_axis(25), tiles_per_axis(MAX_ZOOM));
        assert_eq!(project(55.0, 37.0, 25), project(55.0, 37.0, MAX_ZOOM));

        let point = project(55.0, 37.0, 30);
        let world = (tiles_per_axis(30) * TILE_SIZE) as f64;
        assert!(point.x <= world && point.y <= world);
        let (lat, lon) = unproject(point, 30);
        assert!((lat - 55.0).abs() < 1e-7);
        assert!((lon - 37.0).abs() < 1e-7);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_roundtrip_property(
                lat in -85.0..85.0_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=MAX_ZOOM
            ) {
                let (converted_lat, converted_lon) = unproject(project(lat, lon, zoom), zoom);

                prop_assert!(
                    (converted_lat - lat).abs() < 1e-7,
                    "Latitude roundtrip failed: {} -> {}",
                    lat, converted_lat
                );
                prop_assert!(
                    (converted_lon - lon).abs() < 1e-7,
                    "Longitude roundtrip failed: {} -> {}",
                    lon, converted_lon
                );
            }

            #[test]
            fn test_projection_in_world_bounds(
                lat in -85.0..85.0_f64,
                lon in -180.0..180.0_f64,
                zoom in 0u8..=MAX_ZOOM
            ) {
                let point = project(lat, lon, zoom);
                let world = (tiles_per_axis(zoom) * TILE_SIZE) as f64;

                prop_assert!(point.x >= 0.0 && point.x <= world);
                prop_assert!(point.y >= 0.0 && point.y <= world);
            }

            #[test]
            fn test_longitude_monotonic(
                lat in -60.0..60.0_f64,
                lon1 in -180.0..-1.0_f64,
                lon2 in 1.0..180.0_f64,
            ) {
                let west = project(lat, lon1, DEFAULT_ZOOM);
                let east = project(lat, lon2, DEFAULT_ZOOM);
                prop_assert!(west.x < east.x);
            }
        }
    }
}
