//! Shared visual state.
//!
//! [`StateStore`] is the single synchronization point between the ingestion
//! tasks and the render loop. Every mutation takes the lock for exactly its
//! own critical section, and readers only hold it long enough to copy the
//! state into a [`Snapshot`].
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(StateStore::new());
//!
//! // Ingestion side
//! store.apply(decode_envelope(line)?);
//!
//! // Render side, once per frame
//! let snapshot = store.sweep_and_snapshot(Instant::now());
//! ```

mod snapshot;

pub use snapshot::{PacketMessage, PathFrame, Snapshot};

use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::animation::{PaletteSequence, PathAnimation, Pulse};
use crate::coord::{project_point, Viewport, DEFAULT_ZOOM};
use crate::decoder::{PacketReport, PropagationTrace, StreamEvent};
use crate::node::{Node, NodeTable};

/// Number of packet lines kept in the rolling log.
pub const PACKET_LOG_CAPACITY: usize = 5;

/// Connection status before the stream reports anything.
pub const INITIAL_STATUS: &str = "Initializing...";

/// Last-update label before any event or refresh arrives.
pub const NEVER_UPDATED: &str = "Never";

/// Wall-clock label used for log lines and the last-update field.
fn time_label() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

/// What applying one event changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Connection status replaced.
    Status,
    /// Only the last-update label changed.
    Touched,
    /// Packet line logged; `pulse` tells whether an animation was emitted.
    Packet { pulse: bool },
    /// Path animation emitted with this many points.
    Path { points: usize },
    /// Path dropped because fewer than two hops resolved to positioned nodes.
    PathDropped { resolved: usize },
    /// Nothing to apply.
    Ignored,
}

impl ApplyOutcome {
    /// Whether the event produced a visible change.
    pub fn is_applied(&self) -> bool {
        !matches!(self, ApplyOutcome::Ignored | ApplyOutcome::PathDropped { .. })
    }
}

/// Number of animations removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepResult {
    pub pulses_removed: usize,
    pub paths_removed: usize,
}

impl SweepResult {
    pub fn total(&self) -> usize {
        self.pulses_removed + self.paths_removed
    }
}

#[derive(Debug)]
struct VisualState {
    table: NodeTable,
    packet_log: VecDeque<PacketMessage>,
    pulses: Vec<Pulse>,
    paths: Vec<PathAnimation>,
    connection_status: String,
    last_update: String,
    animations_enabled: bool,
    selected_node: Option<usize>,
    palette: PaletteSequence,
}

impl VisualState {
    fn new(palette: PaletteSequence) -> Self {
        Self {
            table: NodeTable::default(),
            packet_log: VecDeque::with_capacity(PACKET_LOG_CAPACITY + 1),
            pulses: Vec::new(),
            paths: Vec::new(),
            connection_status: INITIAL_STATUS.to_string(),
            last_update: NEVER_UPDATED.to_string(),
            animations_enabled: true,
            selected_node: None,
            palette,
        }
    }

    fn apply_packet(&mut self, report: &PacketReport, now: Instant) -> ApplyOutcome {
        let label = time_label();
        self.packet_log.push_front(PacketMessage {
            text: report.log_line(&label),
            received_at: now,
        });
        self.packet_log.truncate(PACKET_LOG_CAPACITY);

        let endpoints = report.route.as_ref().and_then(|(src, dst)| {
            let src = self.table.resolve(src)?.position?;
            let dst = self.table.resolve(dst)?.position?;
            Some((src, dst))
        });

        let pulse = match endpoints {
            Some((src, dst)) => {
                self.pulses.push(Pulse::new(
                    project_point(src, DEFAULT_ZOOM),
                    project_point(dst, DEFAULT_ZOOM),
                    now,
                ));
                true
            }
            None => false,
        };

        self.last_update = label;
        ApplyOutcome::Packet { pulse }
    }

    fn apply_propagation(&mut self, trace: &PropagationTrace, now: Instant) -> ApplyOutcome {
        let points: Vec<_> = trace
            .hops
            .iter()
            .filter_map(|hop| self.table.resolve(hop)?.position)
            .map(|position| project_point(position, DEFAULT_ZOOM))
            .collect();

        self.last_update = time_label();

        if points.len() < 2 {
            debug!(
                hops = trace.hops.len(),
                resolved = points.len(),
                "Propagation path dropped"
            );
            return ApplyOutcome::PathDropped {
                resolved: points.len(),
            };
        }

        let count = points.len();
        let color = self.palette.next_color();
        self.paths
            .push(PathAnimation::new(points, trace.hop_count, now, color));
        trace!(points = count, "Propagation path added");
        ApplyOutcome::Path { points: count }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.table.nodes().to_vec(),
            packet_log: self.packet_log.iter().cloned().collect(),
            pulses: self.pulses.clone(),
            paths: self.paths.clone(),
            connection_status: self.connection_status.clone(),
            last_update: self.last_update.clone(),
            animations_enabled: self.animations_enabled,
            selected_node: self.selected_node,
        }
    }

    fn sweep(&mut self, now: Instant) -> SweepResult {
        let pulses_before = self.pulses.len();
        let paths_before = self.paths.len();
        self.pulses.retain(|pulse| !pulse.is_expired(now));
        self.paths.retain(|path| !path.is_expired(now));
        SweepResult {
            pulses_removed: pulses_before - self.pulses.len(),
            paths_removed: paths_before - self.paths.len(),
        }
    }
}

/// The single synchronized hub for nodes, log, animations and status.
#[derive(Debug)]
pub struct StateStore {
    inner: Mutex<VisualState>,
}

impl StateStore {
    /// Create an empty store with a clock-seeded palette.
    pub fn new() -> Self {
        Self::with_palette(PaletteSequence::from_clock())
    }

    /// Create an empty store with an explicit palette sequence.
    pub fn with_palette(palette: PaletteSequence) -> Self {
        Self {
            inner: Mutex::new(VisualState::new(palette)),
        }
    }

    /// Apply a decoded event at the current instant.
    pub fn apply(&self, event: &StreamEvent) -> ApplyOutcome {
        self.apply_at(event, Instant::now())
    }

    /// Apply a decoded event, stamping new animations with `now`.
    pub fn apply_at(&self, event: &StreamEvent, now: Instant) -> ApplyOutcome {
        let mut state = self.inner.lock();
        match event {
            StreamEvent::Status(status) => {
                state.connection_status.clone_from(status);
                ApplyOutcome::Status
            }
            StreamEvent::Ping => {
                state.last_update = time_label();
                ApplyOutcome::Touched
            }
            StreamEvent::Packet(report) => state.apply_packet(report, now),
            StreamEvent::Propagation(trace) => state.apply_propagation(trace, now),
            StreamEvent::Unrendered => {
                state.last_update = time_label();
                ApplyOutcome::Touched
            }
            StreamEvent::Ignored => ApplyOutcome::Ignored,
        }
    }

    /// Replace the node list and rebuild the hash index.
    ///
    /// An empty list is ignored so a transient upstream glitch cannot wipe
    /// the map. Returns whether the list was replaced.
    pub fn replace_nodes(&self, nodes: Vec<Node>) -> bool {
        if nodes.is_empty() {
            return false;
        }
        let mut state = self.inner.lock();
        let count = nodes.len();
        state.table.replace(nodes);
        if state.selected_node.is_some_and(|index| index >= count) {
            state.selected_node = None;
        }
        state.last_update = time_label();
        true
    }

    /// Drop expired pulses and paths.
    pub fn sweep(&self, now: Instant) -> SweepResult {
        self.inner.lock().sweep(now)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().snapshot()
    }

    /// Sweep and copy under a single lock acquisition; the per-frame read.
    pub fn sweep_and_snapshot(&self, now: Instant) -> Snapshot {
        let mut state = self.inner.lock();
        let swept = state.sweep(now);
        if swept.total() > 0 {
            trace!(
                pulses = swept.pulses_removed,
                paths = swept.paths_removed,
                "Swept expired animations"
            );
        }
        state.snapshot()
    }

    /// Flip the animations flag and return the new value.
    pub fn toggle_animations(&self) -> bool {
        let mut state = self.inner.lock();
        state.animations_enabled = !state.animations_enabled;
        state.animations_enabled
    }

    /// Set or clear the selection directly.
    pub fn select_node(&self, index: Option<usize>) {
        self.inner.lock().selected_node = index;
    }

    /// Select the first node, in list order, within the pick radius of a
    /// screen position. Clears the selection when nothing is hit.
    pub fn select_node_at(&self, viewport: &Viewport, x: i32, y: i32) -> Option<usize> {
        let mut state = self.inner.lock();
        let hit = state.table.nodes().iter().position(|node| {
            node.position.is_some_and(|position| {
                viewport.within_pick_radius(viewport.geo_to_screen(position), x, y)
            })
        });
        state.selected_node = hit;
        hit
    }

    pub fn connection_status(&self) -> String {
        self.inner.lock().connection_status.clone()
    }

    pub fn node_count(&self) -> usize {
        self.inner.lock().table.len()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
