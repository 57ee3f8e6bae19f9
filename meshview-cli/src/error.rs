//! CLI error type.

use std::fmt;

use meshview::app::{AppError, ConfigError};
use meshview::decoder::DecodeError;
use meshview::logging::LoggingError;
use meshview::tiles::{HttpError, TileError};

/// Errors surfaced to the user by the `meshview` binary.
#[derive(Debug)]
pub enum CliError {
    /// Invalid or incomplete configuration.
    Config(String),

    /// Engine failed to start.
    App(AppError),

    /// Logging could not be set up.
    Logging(LoggingError),

    /// Node list could not be downloaded.
    Fetch(HttpError),

    /// Node list was not a valid advert collection.
    Decode(DecodeError),

    /// Tile cache could not be opened.
    Tiles(TileError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Fetch(e) => write!(f, "Failed to fetch nodes: {}", e),
            CliError::Decode(e) => write!(f, "Invalid node list: {}", e),
            CliError::Tiles(e) => write!(f, "Tile cache error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::App(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Decode(e) => Some(e),
            CliError::Tiles(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<HttpError> for CliError {
    fn from(e: HttpError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<DecodeError> for CliError {
    fn from(e: DecodeError) -> Self {
        CliError::Decode(e)
    }
}

impl From<TileError> for CliError {
    fn from(e: TileError) -> Self {
        CliError::Tiles(e)
    }
}
