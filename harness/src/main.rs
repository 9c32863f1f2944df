#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Claim Topics Devnet
//!
//! Runs the devnet harness as a standalone JSON-RPC endpoint so the
//! `claim-topics` CLI can be exercised without a real ledger node.
//!
//! Environment:
//! - `CLAIM_TOPICS_DEVNET_PORT`: listening port (default 8545)
//! - `CLAIM_TOPICS_DEVNET_TOPICS`: comma-separated genesis topics (e.g. `1,2,3`)

use std::net::SocketAddr;
use std::sync::Arc;

use harness::{Devnet, DevnetConfig, DevnetServer};
use types::Topic;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("CLAIM_TOPICS_DEVNET_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8545);

    let topics = std::env::var("CLAIM_TOPICS_DEVNET_TOPICS")
        .map(|list| {
            list.split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse::<Topic>)
                .collect::<Result<Vec<_>, _>>()
        })
        .unwrap_or_else(|_| Ok(Vec::new()))?;

    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let devnet = Arc::new(Devnet::new(DevnetConfig { topics, ..Default::default() }));
    let server = DevnetServer::bind(addr, devnet.clone())?;

    println!("Claim Topics devnet listening on {}", server.url());
    println!("Health check: {}/health", server.url());
    println!("Registry: {}", devnet.registry());
    println!("Owner:    {}", devnet.owner());

    tokio::signal::ctrl_c().await?;
    drop(server);
    Ok(())
}
