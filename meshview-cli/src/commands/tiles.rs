//! Tile cache CLI commands.

use clap::Subcommand;
use meshview::coord::{GeoPoint, Viewport, DEFAULT_HEIGHT, DEFAULT_WIDTH, DEFAULT_ZOOM, MAX_ZOOM};
use meshview::tiles::TileCache;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Tile action subcommands.
#[derive(Debug, Subcommand)]
pub enum TileAction {
    /// Download and cache every tile visible around a position
    Warm {
        /// Center latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Center longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom level
        #[arg(long, default_value_t = DEFAULT_ZOOM, value_parser = clap::value_parser!(u8).range(0..=MAX_ZOOM as i64))]
        zoom: u8,

        /// Viewport width in pixels
        #[arg(long, default_value_t = DEFAULT_WIDTH)]
        width: u32,

        /// Viewport height in pixels
        #[arg(long, default_value_t = DEFAULT_HEIGHT)]
        height: u32,
    },
    /// Show the cache directory and tile source
    Info,
}

/// Run a tiles subcommand.
pub fn run(runner: CliRunner, action: TileAction) -> Result<(), CliError> {
    runner.log_startup("tiles");
    let config = runner.config();

    match action {
        TileAction::Warm {
            lat,
            lon,
            zoom,
            width,
            height,
        } => {
            let center = GeoPoint::from_parts(Some(lat), Some(lon)).ok_or_else(|| {
                CliError::Config(format!("Invalid position {}, {}", lat, lon))
            })?;
            let viewport = Viewport::new(center, zoom, width, height);
            let cache = TileCache::open(config.cache_dir.clone(), config.tile_source())?;

            let tiles = viewport.visible_tiles();
            println!("Warming {} tiles at zoom {}", tiles.len(), zoom);
            let mut missing = 0;
            for (key, _) in &tiles {
                if cache.get(*key).is_none() {
                    missing += 1;
                    println!("  {} unavailable", key);
                }
            }

            let stats = cache.stats();
            println!();
            println!("  Cached:     {}", tiles.len() - missing);
            println!("  From disk:  {}", stats.disk_loads);
            println!("  Requests:   {}", stats.fetches);
            println!("  Failed:     {}", missing);
            Ok(())
        }
        TileAction::Info => {
            println!("Tile cache: {}", config.cache_dir.display());
            println!("Source:     {}", config.tile_url);
            Ok(())
        }
    }
}
