//! Binary entry point for the LSP relay.
//!
//! stdin and stdout carry the LSP wire protocol, so all logging goes to
//! stderr. Only fatal failures terminate the relay; backend refusals are
//! absorbed by the handshake retry cycle.

mod cli;

use std::{process::ExitCode, time::Duration};

use clap::Parser;
use lsp_relay::{
    relay::{Relay, RelayConfig},
    transport::HttpTransport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let config = RelayConfig {
        backend_url: cli.backend_url,
        retry_period: Duration::from_millis(cli.retry_interval_ms),
        max_frame_length: cli.max_frame_length,
    };

    tracing::info!(backend_url = %config.backend_url, "starting lsp-relay");

    let transport = HttpTransport::new(config.backend_url.clone());
    let relay = Relay::new(&config, transport, tokio::io::stdin(), tokio::io::stdout());

    match relay.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "relay terminated");
            ExitCode::FAILURE
        }
    }
}
