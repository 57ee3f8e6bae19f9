//! Decoder error types.

use thiserror::Error;

/// Reasons a payload produced no event.
///
/// None of these are fatal: the ingestion loop logs them at debug level and
/// moves on to the next line.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Payload exceeds the size limit.
    #[error("Payload too large: {size} bytes (max: {max})")]
    Oversized { size: usize, max: usize },

    /// Payload does not start with a JSON object.
    #[error("Payload is not a JSON object")]
    NotAnObject,

    /// Advert list root is not a JSON array.
    #[error("Advert list is not a JSON array")]
    NotAnArray,

    /// JSON syntax error or truncated input.
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent or has the wrong shape.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Propagation path lists fewer than two hops.
    #[error("Path has {0} nodes, need at least 2")]
    PathTooShort(usize),
}
