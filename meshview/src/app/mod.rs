//! Application bootstrap, configuration and errors.
//!
//! [`MeshViewApp`] wires the pieces together in a fixed order:
//!
//! ```text
//! ViewerConfig ──► Tokio runtime ──► TileCache ──► StateStore ──► IngestionPipeline
//!                                                      │
//!                                                      └──► ViewerSession (render side)
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::MeshViewApp;
pub use config::{
    default_cache_dir, default_log_dir, ConfigError, ViewerConfig, DEFAULT_SERVER_URL,
    ENV_CACHE_DIR, ENV_LOG_DIR, ENV_SERVER_URL, ENV_TILE_URL,
};
pub use error::AppError;
