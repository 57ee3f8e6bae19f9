//! MeshView - real-time state engine for a live mesh-network visualizer
//!
//! The engine subscribes to a server's event stream and periodically
//! refreshes its node list, derives decaying animations and a rolling packet
//! log from the events, and serves a disk-backed map tile cache. Drawing is
//! left to the front-end, which reads immutable [`state::Snapshot`]s.
//!
//! # Architecture
//!
//! ```text
//!   GET /sse ──► ingest::StreamTask ──► decoder ──┐
//!                                                 ├──► state::StateStore ──► Snapshot ──► front-end
//!   GET /api/adverts ──► ingest::PollerTask ──────┘          ▲
//!                                                            │
//!                                   session::ViewerSession ──┘  (reset view, toggle, select)
//!
//!   tiles::TileCache ◄── front-end (blocking on miss)
//! ```

pub mod animation;
pub mod app;
pub mod color;
pub mod coord;
pub mod decoder;
pub mod ingest;
pub mod logging;
pub mod node;
pub mod session;
pub mod state;
pub mod supervisor;
pub mod tiles;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
