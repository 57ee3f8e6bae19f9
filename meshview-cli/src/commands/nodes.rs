//! Nodes command - fetch the node list once and print it.

use meshview::decoder::parse_adverts;
use meshview::node::Node;
use meshview::tiles::{HttpClient, ReqwestClient};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the nodes command.
pub fn run(runner: CliRunner, positioned_only: bool) -> Result<(), CliError> {
    runner.log_startup("nodes");
    let url = runner.config().ingestion().adverts_url();

    let client = ReqwestClient::new()?;
    let body = client.get(&url)?;
    let nodes = parse_adverts(&body)?;

    let shown: Vec<&Node> = nodes
        .iter()
        .filter(|node| !positioned_only || node.has_position())
        .collect();

    println!("{} nodes from {}", nodes.len(), url);
    println!();
    println!("{:<24} {:<12} {:<10} {:>10} {:>11}", "NAME", "KIND", "HASH", "LAT", "LON");
    for node in shown {
        println!("{}", format_row(node));
    }
    Ok(())
}

fn format_row(node: &Node) -> String {
    let (lat, lon) = match node.position {
        Some(position) => (format!("{:.5}", position.lat), format!("{:.5}", position.lon)),
        None => ("-".to_string(), "-".to_string()),
    };
    let hash = if node.hash == 0 {
        "-".to_string()
    } else {
        node.hash_hex()
    };
    format!(
        "{:<24} {:<12} {:<10} {:>10} {:>11}",
        node.display_name(),
        node.kind().label(),
        hash,
        lat,
        lon
    )
}
