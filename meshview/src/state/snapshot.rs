//! Immutable copies of the visual state handed to the renderer.

use std::time::Instant;

use crate::animation::{PathAnimation, Pulse, Stroke};
use crate::coord::WorldPoint;
use crate::node::Node;

/// One formatted entry of the recent-transmissions log.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketMessage {
    pub text: String,
    pub received_at: Instant,
}

/// A deep copy of the visual state at one point in time.
///
/// Holding a snapshot never blocks ingestion; it simply goes stale.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub nodes: Vec<Node>,
    /// Newest first.
    pub packet_log: Vec<PacketMessage>,
    pub pulses: Vec<Pulse>,
    pub paths: Vec<PathAnimation>,
    pub connection_status: String,
    pub last_update: String,
    pub animations_enabled: bool,
    pub selected_node: Option<usize>,
}

/// A path ready to be stroked: its points and layers at the draw instant.
#[derive(Debug, Clone, PartialEq)]
pub struct PathFrame<'a> {
    pub points: &'a [WorldPoint],
    pub strokes: [Stroke; 3],
}

impl Snapshot {
    /// The selected node, if the selection still points inside the node list.
    pub fn selected_node(&self) -> Option<&Node> {
        self.selected_node.and_then(|index| self.nodes.get(index))
    }

    pub fn positioned_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|node| node.has_position())
    }

    /// Pulse marker positions to draw at `now`.
    ///
    /// Empty while animations are disabled; pulses outside their travel
    /// window are skipped.
    pub fn pulse_positions(&self, now: Instant) -> Vec<WorldPoint> {
        if !self.animations_enabled {
            return Vec::new();
        }
        self.pulses
            .iter()
            .filter_map(|pulse| pulse.position_at(now))
            .collect()
    }

    /// Paths to draw at `now`, with opacity-scaled stroke layers.
    pub fn path_frames(&self, now: Instant) -> Vec<PathFrame<'_>> {
        if !self.animations_enabled {
            return Vec::new();
        }
        self.paths
            .iter()
            .filter_map(|path| {
                path.strokes_at(now).map(|strokes| PathFrame {
                    points: &path.points,
                    strokes,
                })
            })
            .collect()
    }
}
