//! Coordinate value types.

use std::fmt;

/// A validated geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Latitude in degrees (-90.0 to 90.0)
    pub lat: f64,
    /// Longitude in degrees (-180.0 to 180.0)
    pub lon: f64,
}

impl GeoPoint {
    /// Builds a position from optional advert coordinates.
    ///
    /// A position is valid only when both coordinates are present, they are
    /// not both exactly zero (upstream's "unset" marker) and they lie within
    /// ±90° latitude and ±180° longitude.
    pub fn from_parts(lat: Option<f64>, lon: Option<f64>) -> Option<Self> {
        let (lat, lon) = (lat?, lon?);
        if lat == 0.0 && lon == 0.0 {
            return None;
        }
        if !(lat.abs() <= 90.0 && lon.abs() <= 180.0) {
            return None;
        }
        Some(Self { lat, lon })
    }
}

/// A point in world-pixel space at some zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    #[inline]
    pub fn lerp(self, other: WorldPoint, t: f64) -> WorldPoint {
        WorldPoint {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Address of a map tile: zoom level plus grid column (`x`) and row (`y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Zoom level
    pub zoom: u8,
    /// Tile column (0 = west)
    pub x: u32,
    /// Tile row (0 = north)
    pub y: u32,
}

impl TileKey {
    pub const fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_requires_both_coordinates() {
        assert!(GeoPoint::from_parts(Some(55.0), None).is_none());
        assert!(GeoPoint::from_parts(None, Some(37.0)).is_none());
        assert!(GeoPoint::from_parts(Some(55.0), Some(37.0)).is_some());
    }

    #[test]
    fn test_geo_point_rejects_null_island() {
        assert!(GeoPoint::from_parts(Some(0.0), Some(0.0)).is_none());
        // Only one zero coordinate is a real place
        assert!(GeoPoint::from_parts(Some(0.0), Some(37.0)).is_some());
    }

    #[test]
    fn test_geo_point_rejects_out_of_range() {
        assert!(GeoPoint::from_parts(Some(90.5), Some(10.0)).is_none());
        assert!(GeoPoint::from_parts(Some(10.0), Some(-180.5)).is_none());
        assert!(GeoPoint::from_parts(Some(f64::NAN), Some(10.0)).is_none());
        assert!(GeoPoint::from_parts(Some(-90.0), Some(180.0)).is_some());
    }

    #[test]
    fn test_lerp_endpoints() {
        let a = WorldPoint::new(0.0, 10.0);
        let b = WorldPoint::new(100.0, 30.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), WorldPoint::new(50.0, 20.0));
    }

    #[test]
    fn test_tile_key_display() {
        assert_eq!(TileKey::new(10, 619, 320).to_string(), "10/619/320");
    }
}
