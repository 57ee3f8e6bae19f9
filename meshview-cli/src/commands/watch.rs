//! Watch command - run the engine and print what the map would show.

use std::thread;
use std::time::{Duration, Instant};

use meshview::app::MeshViewApp;
use meshview::state::Snapshot;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Frame period of the headless render loop.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Arguments for the watch command.
pub struct WatchArgs {
    /// Seconds between status lines.
    pub status_interval: u64,
    /// Start with animations disabled.
    pub no_animations: bool,
}

/// Run the watch command.
pub fn run(runner: CliRunner, args: WatchArgs) -> Result<(), CliError> {
    runner.log_startup("watch");
    let token = runner.shutdown_token()?;
    let config = runner.into_config();

    println!("MeshView v{}", meshview::VERSION);
    println!("================================");
    println!();
    println!("Server:     {}", config.server_url);
    println!("Tile cache: {}", config.cache_dir.display());
    println!("Log dir:    {}", config.log_dir.display());
    println!();
    println!("Press Ctrl+C to exit");
    println!();

    let app = MeshViewApp::start(config, token)?;
    let session = app.session();
    if args.no_animations {
        session.toggle_animations();
    }

    let status_interval = Duration::from_secs(args.status_interval.max(1));
    let mut last_status = Instant::now();
    let mut printed_up_to: Option<Instant> = None;

    while !app.is_cancelled() {
        thread::sleep(FRAME_INTERVAL);
        let now = Instant::now();
        let frame = session.frame(now);

        printed_up_to = print_new_packets(&frame, printed_up_to);

        if now.duration_since(last_status) >= status_interval {
            print_status(&frame, now);
            last_status = now;
        }
    }

    let stats = app.shutdown();
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!(
        "  Stream:  {} connections, {} disconnects",
        stats.connections, stats.disconnects
    );
    println!(
        "  Events:  {} applied, {} ignored, {} dropped",
        stats.events_applied, stats.events_ignored, stats.events_dropped
    );
    println!(
        "  Polls:   {} ok, {} empty, {} failed",
        stats.polls_succeeded, stats.polls_empty, stats.polls_failed
    );
    Ok(())
}

/// Print log lines received after `since`, oldest first.
fn print_new_packets(frame: &Snapshot, since: Option<Instant>) -> Option<Instant> {
    let mut newest = since;
    for message in frame.packet_log.iter().rev() {
        if since.map_or(true, |seen| message.received_at > seen) {
            println!("  {}", message.text);
            newest = Some(message.received_at);
        }
    }
    newest
}

fn print_status(frame: &Snapshot, now: Instant) {
    let selected = frame
        .selected_node()
        .map(|node| node.display_name().to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{}] nodes {} ({} on map) | pulses {} | paths {} | last update {} | selected {}",
        frame.connection_status,
        frame.nodes.len(),
        frame.positioned_nodes().count(),
        frame.pulse_positions(now).len(),
        frame.path_frames(now).len(),
        frame.last_update,
        selected
    );
}
