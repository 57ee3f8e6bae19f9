//! HTTP client abstraction for tile downloads.

use std::time::Duration;

use thiserror::Error;

/// Connect timeout applied to tile downloads.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// User agent sent with tile requests. Public tile servers reject anonymous clients.
pub const USER_AGENT: &str = concat!("meshview/", env!("CARGO_PKG_VERSION"));

/// Errors from a tile download.
#[derive(Debug, Clone, Error)]
pub enum HttpError {
    /// Client could not be constructed.
    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    /// Request could not be sent or the body could not be read.
    #[error("Request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

/// Trait for HTTP client operations.
///
/// Lets the tile cache run against a mock in tests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and returns the body.
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError>;
}

/// Blocking HTTP client backed by reqwest.
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Creates a client with the default connect timeout.
    pub fn new() -> Result<Self, HttpError> {
        Self::with_connect_timeout(CONNECT_TIMEOUT)
    }

    /// Creates a client with a custom connect timeout.
    ///
    /// No overall request timeout is set; a slow tile server stalls only the
    /// caller that asked for the tile.
    pub fn with_connect_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn get(&self, url: &str) -> Result<Vec<u8>, HttpError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| HttpError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| HttpError::Request(format!("Failed to read response: {}", e)))
    }
}
