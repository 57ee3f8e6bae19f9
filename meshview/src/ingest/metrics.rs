//! Ingestion counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters shared by the stream and poller tasks.
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    connections: AtomicU64,
    disconnects: AtomicU64,
    events_applied: AtomicU64,
    events_ignored: AtomicU64,
    events_dropped: AtomicU64,
    lines_discarded: AtomicU64,
    polls_succeeded: AtomicU64,
    polls_empty: AtomicU64,
    polls_failed: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(&self) {
        self.connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn disconnected(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_applied(&self) {
        self.events_applied.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn event_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn lines_discarded(&self, count: u64) {
        self.lines_discarded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn poll_succeeded(&self) {
        self.polls_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_empty(&self) {
        self.polls_empty.fetch_add(1, Ordering::Relaxed);
    }

    pub fn poll_failed(&self) {
        self.polls_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter.
    pub fn snapshot(&self) -> IngestionStats {
        IngestionStats {
            connections: self.connections.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            events_applied: self.events_applied.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            lines_discarded: self.lines_discarded.load(Ordering::Relaxed),
            polls_succeeded: self.polls_succeeded.load(Ordering::Relaxed),
            polls_empty: self.polls_empty.load(Ordering::Relaxed),
            polls_failed: self.polls_failed.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`IngestionMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestionStats {
    /// Stream connections that received a success status.
    pub connections: u64,
    /// Stream connections that ended, for any reason.
    pub disconnects: u64,
    /// Events that changed visual state.
    pub events_applied: u64,
    /// Well-formed events with nothing to apply.
    pub events_ignored: u64,
    /// Payloads rejected by the decoder.
    pub events_dropped: u64,
    /// Oversized partial lines thrown away.
    pub lines_discarded: u64,
    /// Polls that replaced the node list.
    pub polls_succeeded: u64,
    /// Polls that returned no nodes.
    pub polls_empty: u64,
    /// Polls that failed in transport or parsing.
    pub polls_failed: u64,
}

impl IngestionStats {
    pub fn events_total(&self) -> u64 {
        self.events_applied + self.events_ignored + self.events_dropped
    }
}
