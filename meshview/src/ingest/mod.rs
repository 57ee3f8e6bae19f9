//! Background ingestion of the event stream and the node list.
//!
//! Two independent tasks run on the tokio runtime until the cancellation
//! token fires:
//!
//! - the **stream subscriber** holds a long-lived `GET <base>/sse`, splits
//!   the body into lines and applies each decoded `data: ` payload to the
//!   [`StateStore`]; on any disconnect it waits a fixed delay and reconnects
//! - the **poller** fetches `GET <base>/api/adverts` immediately and then on
//!   a fixed interval, replacing the node list on every non-empty result
//!
//! Network failures never stop either task.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(StateStore::new());
//! let handle = IngestionPipeline::start(
//!     Arc::clone(&store),
//!     IngestionConfig::new("http://localhost:3000"),
//!     CancellationToken::new(),
//! )?;
//!
//! // ... render loop ...
//!
//! handle.shutdown().await;
//! ```

mod error;
mod lines;
mod metrics;
mod poller;
mod stream;

pub use error::IngestError;
pub use lines::{SseLineBuffer, DATA_PREFIX, MAX_PENDING_LINE};
pub use metrics::{IngestionMetrics, IngestionStats};

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::state::StateStore;
use poller::PollerTask;
use stream::StreamTask;

/// Delay before reconnecting a dropped stream.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Interval between node list refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Connect timeout for both tasks. Stream reads have no overall timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Path of the event stream relative to the base URL.
pub const STREAM_PATH: &str = "/sse";

/// Path of the node list relative to the base URL.
pub const ADVERTS_PATH: &str = "/api/adverts";

/// Configuration for the ingestion tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionConfig {
    /// Server base URL without a trailing slash.
    pub base_url: String,
    pub reconnect_delay: Duration,
    pub poll_interval: Duration,
    pub connect_timeout: Duration,
}

impl IngestionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn stream_url(&self) -> String {
        format!("{}{}", self.base_url, STREAM_PATH)
    }

    pub fn adverts_url(&self) -> String {
        format!("{}{}", self.base_url, ADVERTS_PATH)
    }
}

/// Entry point for starting the ingestion tasks.
pub struct IngestionPipeline;

impl IngestionPipeline {
    /// Spawn the stream subscriber and the poller on the current runtime.
    ///
    /// Must be called from within a tokio runtime. Both tasks observe
    /// `cancellation`; cancelling it (directly or through
    /// [`IngestionHandle::shutdown`]) stops them at their next await point.
    pub fn start(
        store: Arc<StateStore>,
        config: IngestionConfig,
        cancellation: CancellationToken,
    ) -> Result<IngestionHandle, IngestError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(crate::tiles::USER_AGENT)
            .build()
            .map_err(IngestError::Client)?;
        let metrics = Arc::new(IngestionMetrics::new());

        let stream = StreamTask {
            client: client.clone(),
            url: config.stream_url(),
            store: Arc::clone(&store),
            metrics: Arc::clone(&metrics),
            reconnect_delay: config.reconnect_delay,
        };
        let poller = PollerTask {
            client,
            url: config.adverts_url(),
            store,
            metrics: Arc::clone(&metrics),
            interval: config.poll_interval,
        };

        info!(base_url = %config.base_url, "Starting ingestion pipeline");
        let tasks = vec![
            tokio::spawn(stream.run(cancellation.clone())),
            tokio::spawn(poller.run(cancellation.clone())),
        ];

        Ok(IngestionHandle {
            tasks,
            metrics,
            cancellation,
        })
    }
}

/// Handle to the running ingestion tasks.
pub struct IngestionHandle {
    tasks: Vec<JoinHandle<()>>,
    metrics: Arc<IngestionMetrics>,
    cancellation: CancellationToken,
}

impl IngestionHandle {
    /// Current counter values.
    pub fn stats(&self) -> IngestionStats {
        self.metrics.snapshot()
    }

    /// Whether shutdown has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Get the cancellation token.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Cancel both tasks and wait for them to finish.
    pub async fn shutdown(self) -> IngestionStats {
        self.cancellation.cancel();
        for task in self.tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "Ingestion task ended abnormally");
            }
        }
        info!("Ingestion pipeline stopped");
        self.metrics.snapshot()
    }
}
