//! Application error types.

use std::fmt;

use super::ConfigError;
use crate::ingest::IngestError;
use crate::logging::LoggingError;
use crate::tiles::TileError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// Configuration error.
    Config(ConfigError),

    /// Failed to create the tile cache.
    TileCache(TileError),

    /// Failed to start the ingestion pipeline.
    Ingestion(IngestError),

    /// Failed to create the Tokio runtime.
    RuntimeCreation(String),

    /// Failed to initialize logging.
    Logging(LoggingError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Configuration error: {}", e),
            AppError::TileCache(e) => write!(f, "Failed to create tile cache: {}", e),
            AppError::Ingestion(e) => write!(f, "Failed to start ingestion: {}", e),
            AppError::RuntimeCreation(msg) => {
                write!(f, "Failed to create Tokio runtime: {}", msg)
            }
            AppError::Logging(e) => write!(f, "Failed to initialize logging: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::TileCache(e) => Some(e),
            AppError::Ingestion(e) => Some(e),
            AppError::Logging(e) => Some(e),
            AppError::RuntimeCreation(_) => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Config(e)
    }
}

impl From<TileError> for AppError {
    fn from(e: TileError) -> Self {
        AppError::TileCache(e)
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        AppError::Ingestion(e)
    }
}

impl From<LoggingError> for AppError {
    fn from(e: LoggingError) -> Self {
        AppError::Logging(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config(ConfigError::InvalidTileTemplate("x".to_string()));
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_app_error_from_ingest_error() {
        let ingest = IngestError::Status {
            status: 500,
            url: "http://localhost:3000/sse".to_string(),
        };
        let app_err: AppError = ingest.into();
        assert!(matches!(app_err, AppError::Ingestion(_)));
    }

    #[test]
    fn test_runtime_error_has_no_source() {
        let err = AppError::RuntimeCreation("no threads".to_string());
        assert!(err.source().is_none());
        assert_eq!(err.to_string(), "Failed to create Tokio runtime: no threads");
    }
}
