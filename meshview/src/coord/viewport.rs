//! Screen viewport over the projected world.
//!
//! The viewport is owned by the render side; it is plain data and never
//! shared across threads.

use super::{clamp_zoom, project, tiles_per_axis, GeoPoint, TileKey, WorldPoint, DEFAULT_ZOOM, TILE_SIZE};

/// Default map center latitude (Moscow).
pub const DEFAULT_CENTER_LAT: f64 = 55.7558;

/// Default map center longitude (Moscow).
pub const DEFAULT_CENTER_LON: f64 = 37.6176;

/// Default viewport width in pixels.
pub const DEFAULT_WIDTH: u32 = 1280;

/// Default viewport height in pixels.
pub const DEFAULT_HEIGHT: u32 = 720;

/// Pick radius for node selection, in screen pixels.
pub const SELECTION_RADIUS_PX: f64 = 10.0;

/// A window onto the world map: geographic center, zoom and pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    center: GeoPoint,
    zoom: u8,
    width: u32,
    height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: GeoPoint {
                lat: DEFAULT_CENTER_LAT,
                lon: DEFAULT_CENTER_LON,
            },
            zoom: DEFAULT_ZOOM,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Viewport {
    /// Create a viewport centered on the given position. Zoom is clamped
    /// to [`MAX_ZOOM`](super::MAX_ZOOM).
    pub fn new(center: GeoPoint, zoom: u8, width: u32, height: u32) -> Self {
        Self {
            center,
            zoom: clamp_zoom(zoom),
            width,
            height,
        }
    }

    pub fn center(&self) -> GeoPoint {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Move the view to a new center.
    pub fn set_center(&mut self, center: GeoPoint) {
        self.center = center;
    }

    /// Track a window resize.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Return to the default center. Size and zoom are kept.
    pub fn reset(&mut self) {
        self.center = GeoPoint {
            lat: DEFAULT_CENTER_LAT,
            lon: DEFAULT_CENTER_LON,
        };
    }

    /// World-pixel position of the screen's top-left corner.
    pub fn top_left(&self) -> WorldPoint {
        let center = project(self.center.lat, self.center.lon, self.zoom);
        WorldPoint::new(
            center.x - self.width as f64 / 2.0,
            center.y - self.height as f64 / 2.0,
        )
    }

    /// Convert a world-pixel position into screen pixels.
    pub fn world_to_screen(&self, point: WorldPoint) -> (f64, f64) {
        let origin = self.top_left();
        (point.x - origin.x, point.y - origin.y)
    }

    /// Screen position of a geographic point, projected at this view's zoom.
    pub fn geo_to_screen(&self, point: GeoPoint) -> (f64, f64) {
        self.world_to_screen(project(point.lat, point.lon, self.zoom))
    }

    /// Whether a screen position lies within the pick radius of a query point.
    ///
    /// Positions are truncated to whole pixels before comparing, matching
    /// how the front-end rasterizes node markers.
    pub fn within_pick_radius(&self, screen: (f64, f64), x: i32, y: i32) -> bool {
        let dx = screen.0 as i64 - x as i64;
        let dy = screen.1 as i64 - y as i64;
        let radius = SELECTION_RADIUS_PX as i64;
        dx * dx + dy * dy <= radius * radius
    }

    /// Tiles overlapping the viewport, column-major, each with its screen offset.
    ///
    /// Tiles outside the world grid (negative or beyond `2^zoom`) are skipped.
    pub fn visible_tiles(&self) -> Vec<(TileKey, (f64, f64))> {
        let origin = self.top_left();
        let size = TILE_SIZE as f64;
        let limit = tiles_per_axis(self.zoom) as i64;

        let start_x = (origin.x / size).floor() as i64;
        let start_y = (origin.y / size).floor() as i64;
        let end_x = ((origin.x + self.width as f64) / size).floor() as i64 + 1;
        let end_y = ((origin.y + self.height as f64) / size).floor() as i64 + 1;

        let mut tiles = Vec::new();
        for tx in start_x..=end_x {
            for ty in start_y..=end_y {
                if tx < 0 || ty < 0 || tx >= limit || ty >= limit {
                    continue;
                }
                let screen = (tx as f64 * size - origin.x, ty as f64 * size - origin.y);
                tiles.push((TileKey::new(self.zoom, tx as u32, ty as u32), screen));
            }
        }
        tiles
    }
}
