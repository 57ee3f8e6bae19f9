//! Periodic node list refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{IngestError, IngestionMetrics};
use crate::decoder::parse_adverts;
use crate::node::Node;
use crate::state::StateStore;

pub(crate) struct PollerTask {
    pub client: reqwest::Client,
    pub url: String,
    pub store: Arc<StateStore>,
    pub metrics: Arc<IngestionMetrics>,
    pub interval: Duration,
}

impl PollerTask {
    /// Fetch immediately, then once per interval. Runs until cancelled.
    pub async fn run(self, cancellation: CancellationToken) {
        info!(url = %self.url, interval = ?self.interval, "Node poller started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let result = tokio::select! {
                biased;

                _ = cancellation.cancelled() => break,
                result = self.fetch_nodes() => result,
            };

            match result {
                Ok(nodes) => {
                    let count = nodes.len();
                    if self.store.replace_nodes(nodes) {
                        self.metrics.poll_succeeded();
                        info!(nodes = count, "Nodes updated");
                    } else {
                        self.metrics.poll_empty();
                        warn!("Node list empty, keeping previous nodes");
                    }
                }
                Err(e) => {
                    self.metrics.poll_failed();
                    warn!(error = %e, "Node fetch failed");
                }
            }
        }

        info!("Node poller stopped");
    }

    async fn fetch_nodes(&self) -> Result<Vec<Node>, IngestError> {
        debug!(url = %self.url, "Fetching nodes");
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await?;
        Ok(parse_adverts(&body)?)
    }
}
