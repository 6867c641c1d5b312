//! Binary crate for the `weather-resolver` service (port 8081).
//!
//! This crate focuses on:
//! - Parsing CLI arguments and interactive configuration
//! - The `GET /{cep}` handler: locality lookup, then current weather
//! - Mapping partner failures onto HTTP statuses

use clap::Parser;

mod cli;
mod handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
