//! Tile URL templates.

use crate::coord::TileKey;

/// Default public tile server.
pub const DEFAULT_TILE_URL: &str = "https://a.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// A URL template with `{z}`, `{x}` and `{y}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSource {
    template: String,
}

impl TileSource {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether the template carries all three placeholders.
    pub fn is_complete(&self) -> bool {
        ["{z}", "{x}", "{y}"]
            .iter()
            .all(|placeholder| self.template.contains(placeholder))
    }

    /// Download URL for one tile.
    pub fn url(&self, key: TileKey) -> String {
        self.template
            .replace("{z}", &key.zoom.to_string())
            .replace("{x}", &key.x.to_string())
            .replace("{y}", &key.y.to_string())
    }
}

impl Default for TileSource {
    fn default() -> Self {
        Self::new(DEFAULT_TILE_URL)
    }
}
