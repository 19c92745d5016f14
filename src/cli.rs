//! Command line interface for the relay binary.

use clap::Parser;

/// Command line arguments for the `lsp-relay` binary.
#[derive(Debug, Parser)]
#[command(
    name = "lsp-relay",
    version,
    about = "Relay LSP traffic between an editor byte stream and an HTTP backend"
)]
pub struct Cli {
    /// Backend endpoint receiving each forwarded message.
    #[arg(long, default_value = "http://localhost:9001/dragon/lsp")]
    pub backend_url: String,

    /// Period in milliseconds between initialize handshake retries.
    #[arg(long, default_value_t = 500)]
    pub retry_interval_ms: u64,

    /// Largest Content-Length accepted from the editor, in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    pub max_frame_length: usize,
}
