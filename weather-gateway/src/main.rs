//! Binary crate for the `weather-gateway` service (port 8080).
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Validating the `POST /` body
//! - Forwarding to `weather-resolver` and relaying its answer

use clap::Parser;

mod cli;
mod client;
mod handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    cmd.run().await
}
