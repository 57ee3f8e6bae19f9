//! Streaming subscriber task.

use std::sync::Arc;

use reqwest::header::{ACCEPT, CACHE_CONTROL};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::lines::SseLineBuffer;
use super::{IngestError, IngestionMetrics};
use crate::decoder::decode_envelope;
use crate::state::StateStore;

/// How a single connection ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamEnd {
    Closed,
    Cancelled,
}

/// Everything the subscriber loop needs.
pub(crate) struct StreamTask {
    pub client: reqwest::Client,
    pub url: String,
    pub store: Arc<StateStore>,
    pub metrics: Arc<IngestionMetrics>,
    pub reconnect_delay: std::time::Duration,
}

impl StreamTask {
    /// Connect, read until the stream ends, wait, reconnect. Runs until cancelled.
    pub async fn run(self, cancellation: CancellationToken) {
        info!(url = %self.url, "Event stream subscriber started");
        let mut lines = SseLineBuffer::new();

        loop {
            lines.reset();
            match self.read_stream(&mut lines, &cancellation).await {
                Ok(StreamEnd::Cancelled) => break,
                Ok(StreamEnd::Closed) => {
                    self.metrics.disconnected();
                    info!("Event stream closed by server");
                }
                Err(e) => {
                    self.metrics.disconnected();
                    warn!(error = %e, "Event stream disconnected");
                }
            }

            debug!(delay = ?self.reconnect_delay, "Reconnecting event stream");
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        info!("Event stream subscriber stopped");
    }

    async fn read_stream(
        &self,
        lines: &mut SseLineBuffer,
        cancellation: &CancellationToken,
    ) -> Result<StreamEnd, IngestError> {
        info!(url = %self.url, "Connecting event stream");
        let request = self
            .client
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send();

        let mut response = tokio::select! {
            biased;

            _ = cancellation.cancelled() => return Ok(StreamEnd::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        self.metrics.connected();
        info!("Event stream connected");

        loop {
            let chunk = tokio::select! {
                biased;

                _ = cancellation.cancelled() => return Ok(StreamEnd::Cancelled),
                chunk = response.chunk() => chunk?,
            };
            let Some(chunk) = chunk else {
                return Ok(StreamEnd::Closed);
            };

            let discarded_before = lines.discarded();
            for payload in lines.push(&chunk) {
                self.dispatch(&payload);
            }
            let discarded = lines.discarded() - discarded_before;
            if discarded > 0 {
                self.metrics.lines_discarded(discarded);
                warn!(limit = super::lines::MAX_PENDING_LINE, "Discarded oversized stream line");
            }
        }
    }

    /// Decode outside the lock, then apply under it.
    fn dispatch(&self, payload: &str) {
        match decode_envelope(payload) {
            Ok(event) => {
                if self.store.apply(&event).is_applied() {
                    self.metrics.event_applied();
                } else {
                    self.metrics.event_ignored();
                }
            }
            Err(e) => {
                self.metrics.event_dropped();
                debug!(error = %e, "Dropped stream payload");
            }
        }
    }
}
