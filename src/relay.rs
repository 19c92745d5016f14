//! Driver loop composing the decoder, session, and retry timer.
//!
//! The relay has exactly two event sources: chunks read from the editor
//! stream and retry-timer ticks. Both funnel into the same non-reentrant
//! forwarding path through a biased `tokio::select!`, so no locking is
//! needed around the connection state.

use std::time::Duration;

use log::info;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite},
    sync::mpsc,
};

use crate::{
    codec::MAX_FRAME_LENGTH,
    error::Result,
    session::ForwardingSession,
    transport::Transport,
};

/// Capacity of the retry-tick channel. Ticks are unit values; the buffer
/// only has to absorb ticks racing a cancellation.
const RETRY_TICK_CAPACITY: usize = 8;

/// Size of the editor-stream read buffer.
const READ_BUFFER_SIZE: usize = 8 * 1024;

/// Relay configuration.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// Backend endpoint receiving each forwarded message.
    pub backend_url: String,
    /// Fixed period between handshake retries.
    pub retry_period: Duration,
    /// Largest declared frame length accepted from the editor.
    pub max_frame_length: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:9001/dragon/lsp".to_owned(),
            retry_period: Duration::from_millis(500),
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

/// Relay driving a [`ForwardingSession`] from an editor input stream.
pub struct Relay<T, R, W> {
    session: ForwardingSession<T, W>,
    editor_in: R,
    retry_rx: mpsc::Receiver<()>,
}

impl<T, R, W> Relay<T, R, W>
where
    T: Transport,
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send,
{
    /// Construct a relay between `editor_in`/`editor_out` and `transport`.
    #[must_use]
    pub fn new(config: &RelayConfig, transport: T, editor_in: R, editor_out: W) -> Self {
        let (retry_tx, retry_rx) = mpsc::channel(RETRY_TICK_CAPACITY);
        let session = ForwardingSession::new(
            transport,
            editor_out,
            retry_tx,
            config.retry_period,
            config.max_frame_length,
        );
        Self {
            session,
            editor_in,
            retry_rx,
        }
    }

    /// Drive the relay until the editor stream reaches EOF or a fatal
    /// error occurs.
    ///
    /// # Errors
    ///
    /// Propagates fatal framing, decode, transport, and stream failures.
    /// Connection refusal never surfaces here; the session recovers from it
    /// via the retry cycle.
    pub async fn run(mut self) -> Result<()> {
        let mut buf = vec![0_u8; READ_BUFFER_SIZE];
        loop {
            tokio::select! {
                biased;

                tick = self.retry_rx.recv() => {
                    // The session holds a sender for timers to clone, so the
                    // channel stays open for the session's lifetime.
                    if tick.is_some() {
                        self.session.trigger_initialize_retry().await?;
                    }
                }
                read = self.editor_in.read(&mut buf) => {
                    let n = read?;
                    if n == 0 {
                        info!("editor stream closed; relay shutting down");
                        return Ok(());
                    }
                    self.session.handle_incoming_data(&buf[..n]).await?;
                }
            }
        }
    }
}
