//! Mesh participants and their lookup table.
//!
//! A [`Node`] is built from an upstream advert record. Nodes are replaced
//! wholesale on every refresh, so [`NodeTable`] rebuilds its hash index from
//! scratch instead of patching it.

mod directory;

pub use directory::{NodeDirectory, NodeRef, NodeTable};

use crate::color::{Rgba, ACCENT};
use crate::coord::GeoPoint;

/// Short numeric node identifier used on the mesh. Zero means "no hash".
pub type NodeHash = u32;

/// Type flags reported by an advert.
///
/// Upstream does not enforce exclusivity, so several flags may be set at
/// once; [`NodeKind::classify`] picks one by fixed precedence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    pub room_server: bool,
    pub repeater: bool,
    pub chat_node: bool,
    pub sensor: bool,
}

/// Display classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    RoomServer,
    Repeater,
    ChatNode,
    Sensor,
    Unclassified,
}

impl NodeKind {
    /// Precedence: room-server > repeater > chat-node > sensor > unclassified.
    pub fn classify(flags: &NodeFlags) -> Self {
        if flags.room_server {
            NodeKind::RoomServer
        } else if flags.repeater {
            NodeKind::Repeater
        } else if flags.chat_node {
            NodeKind::ChatNode
        } else if flags.sensor {
            NodeKind::Sensor
        } else {
            NodeKind::Unclassified
        }
    }

    /// Marker color for this kind.
    pub fn color(self) -> Rgba {
        match self {
            NodeKind::RoomServer => Rgba::opaque(250, 204, 21),
            NodeKind::Repeater => Rgba::opaque(59, 130, 246),
            NodeKind::ChatNode => Rgba::opaque(16, 185, 129),
            NodeKind::Sensor => Rgba::opaque(239, 68, 68),
            NodeKind::Unclassified => ACCENT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NodeKind::RoomServer => "room server",
            NodeKind::Repeater => "repeater",
            NodeKind::ChatNode => "chat node",
            NodeKind::Sensor => "sensor",
            NodeKind::Unclassified => "node",
        }
    }
}

/// A mesh participant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub id: i64,
    pub hash: NodeHash,
    /// Present only when the advert carried a valid position.
    pub position: Option<GeoPoint>,
    pub flags: NodeFlags,
    pub name: String,
    pub public_key_hex: String,
}

impl Node {
    pub fn has_position(&self) -> bool {
        self.position.is_some()
    }

    pub fn kind(&self) -> NodeKind {
        NodeKind::classify(&self.flags)
    }

    pub fn color(&self) -> Rgba {
        self.kind().color()
    }

    /// Name for display, `"Unnamed"` when the advert had none.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            "Unnamed"
        } else {
            &self.name
        }
    }

    /// Upper-case hex encoding of the hash, without padding.
    pub fn hash_hex(&self) -> String {
        format!("{:X}", self.hash)
    }

    /// Whether the public key starts with `needle`.
    ///
    /// `needle` must already be upper-cased; the key is compared
    /// case-insensitively.
    pub(crate) fn key_starts_with(&self, needle: &str) -> bool {
        !self.public_key_hex.is_empty() && starts_with_ignore_case(&self.public_key_hex, needle)
    }

    /// Whether the hash's hex encoding starts with `needle` (upper-cased).
    pub(crate) fn hash_hex_starts_with(&self, needle: &str) -> bool {
        self.hash != 0 && self.hash_hex().starts_with(needle)
    }
}

fn starts_with_ignore_case(haystack: &str, upper_needle: &str) -> bool {
    haystack.len() >= upper_needle.len()
        && haystack
            .bytes()
            .zip(upper_needle.bytes())
            .all(|(h, n)| h.to_ascii_uppercase() == n)
}
