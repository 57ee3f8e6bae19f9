//! Application configuration.
//!
//! Settings come from a key lookup, normally the environment. A CLI layers
//! its flags into the lookup so validation only sees the merged values;
//! builder-style overrides cover programmatic use.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;

use crate::ingest::{IngestionConfig, DEFAULT_POLL_INTERVAL, DEFAULT_RECONNECT_DELAY};
use crate::tiles::{TileSource, DEFAULT_TILE_URL};

/// Server base URL environment variable.
pub const ENV_SERVER_URL: &str = "MESHVIEW_SERVER_URL";

/// Tile cache directory environment variable.
pub const ENV_CACHE_DIR: &str = "MESHVIEW_CACHE_DIR";

/// Log directory environment variable.
pub const ENV_LOG_DIR: &str = "MESHVIEW_LOG_DIR";

/// Tile URL template environment variable.
pub const ENV_TILE_URL: &str = "MESHVIEW_TILE_URL";

/// Server used when nothing is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Base URL is not an absolute http(s) URL.
    #[error("Invalid server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    /// Tile URL template lacks a placeholder.
    #[error("Tile URL template '{0}' must contain {{z}}, {{x}} and {{y}}")]
    InvalidTileTemplate(String),

    /// No platform default for a directory and no override given.
    #[error("Cannot determine default {0} directory; set {1}")]
    NoDefaultDirectory(&'static str, &'static str),
}

/// Top-level configuration for the viewer engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Server base URL, without trailing slash.
    pub server_url: String,

    /// Root of the on-disk tile cache.
    pub cache_dir: PathBuf,

    /// Directory holding `client.log`.
    pub log_dir: PathBuf,

    /// Tile URL template.
    pub tile_url: String,

    /// Delay before reconnecting the event stream.
    pub reconnect_delay: Duration,

    /// Interval between node list refreshes.
    pub poll_interval: Duration,
}

impl ViewerConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let cache_dir = match get(ENV_CACHE_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_cache_dir()
                .ok_or(ConfigError::NoDefaultDirectory("cache", ENV_CACHE_DIR))?,
        };
        let log_dir = match get(ENV_LOG_DIR) {
            Some(dir) => PathBuf::from(dir),
            None => default_log_dir().ok_or(ConfigError::NoDefaultDirectory("log", ENV_LOG_DIR))?,
        };

        let config = Self {
            server_url: get(ENV_SERVER_URL).unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            cache_dir,
            log_dir,
            tile_url: get(ENV_TILE_URL).unwrap_or_else(|| DEFAULT_TILE_URL.to_string()),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        config.validated()
    }

    /// Override the server URL.
    pub fn with_server_url(mut self, url: impl Into<String>) -> Result<Self, ConfigError> {
        self.server_url = url.into();
        self.validated()
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// Override the tile URL template.
    pub fn with_tile_url(mut self, template: impl Into<String>) -> Result<Self, ConfigError> {
        self.tile_url = template.into();
        self.validated()
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Settings for the ingestion tasks.
    pub fn ingestion(&self) -> IngestionConfig {
        IngestionConfig::new(self.server_url.clone())
            .with_reconnect_delay(self.reconnect_delay)
            .with_poll_interval(self.poll_interval)
    }

    pub fn tile_source(&self) -> TileSource {
        TileSource::new(self.tile_url.clone())
    }

    /// Normalize and check the URL fields.
    fn validated(mut self) -> Result<Self, ConfigError> {
        self.server_url = validate_server_url(&self.server_url)?;
        if !TileSource::new(self.tile_url.as_str()).is_complete() {
            return Err(ConfigError::InvalidTileTemplate(self.tile_url));
        }
        Ok(self)
    }
}

fn validate_server_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: &str| ConfigError::InvalidServerUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(trimmed).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query and fragment are not allowed"));
    }
    Ok(trimmed.to_string())
}

/// Default tile cache root: `<cache dir>/meshview/tiles`.
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join("meshview").join("tiles"))
}

/// Default log directory: `<local data dir>/meshview/logs`.
pub fn default_log_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("meshview").join("logs"))
}
