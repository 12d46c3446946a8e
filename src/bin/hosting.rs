//! Quiz Hub Server Binary
//!
//! Runs the HTTP server that hosts the live elimination quiz.
//! Players and the host connect over WebSocket; every setting can be
//! given as a flag or environment variable (see `--help`).

use clap::Parser;
use quizhub::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log()?;
    kys();
    let config = Config::parse();
    hosting::Server::run(config).await
}
