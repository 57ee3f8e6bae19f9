//! MeshView CLI - headless front-end for the mesh-network state engine.
//!
//! `meshview watch` runs the full engine and prints the packet log and a
//! periodic status line; `nodes` and `tiles` are one-shot helpers.

mod commands;
mod error;
mod runner;

use std::process;

use clap::{Parser, Subcommand};

use commands::tiles::TileAction;
use commands::watch::WatchArgs;
use error::CliError;
use runner::{CliRunner, GlobalArgs};

#[derive(Debug, Parser)]
#[command(name = "meshview", version, about = "Live mesh-network map state engine")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Follow the live event stream until interrupted
    Watch {
        /// Seconds between status lines
        #[arg(long, default_value_t = 5)]
        status_interval: u64,

        /// Start with animations disabled
        #[arg(long)]
        no_animations: bool,
    },

    /// Fetch and print the current node list
    Nodes {
        /// Only list nodes with a valid position
        #[arg(long)]
        positioned: bool,
    },

    /// Tile cache management
    Tiles {
        #[command(subcommand)]
        action: TileAction,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let runner = CliRunner::new(&cli.global)?;

    match cli.command {
        Commands::Watch {
            status_interval,
            no_animations,
        } => commands::watch::run(
            runner,
            WatchArgs {
                status_interval,
                no_animations,
            },
        ),
        Commands::Nodes { positioned } => commands::nodes::run(runner, positioned),
        Commands::Tiles { action } => commands::tiles::run(runner, action),
    }
}
