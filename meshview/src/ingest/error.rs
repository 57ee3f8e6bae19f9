//! Ingestion error types.

use thiserror::Error;

use crate::decoder::DecodeError;

/// Errors that end one stream connection or one poll.
///
/// None of these stop the pipeline; the failing task logs the error and
/// retries on its own schedule.
#[derive(Debug, Error)]
pub enum IngestError {
    /// HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connect, send or body read failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Advert list could not be parsed.
    #[error("Invalid advert list: {0}")]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        let err = IngestError::Status {
            status: 502,
            url: "http://localhost:3000/sse".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 502 from http://localhost:3000/sse");
    }

    #[test]
    fn test_from_decode_error() {
        let err: IngestError = DecodeError::NotAnArray.into();
        assert!(matches!(err, IngestError::Decode(_)));
    }
}
