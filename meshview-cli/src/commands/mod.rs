//! Subcommand implementations.

pub mod nodes;
pub mod tiles;
pub mod watch;
