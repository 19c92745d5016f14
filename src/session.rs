//! Connection-lifecycle state machine driving message forwarding.
//!
//! [`ForwardingSession`] owns the single [`ConnectionState`] value, decides
//! per message whether to classify, forward, or trigger the reconnect
//! cycle, and writes backend response bodies back to the editor as framed
//! messages. Forwarding is strictly sequential: the outcome of message *k*
//! is awaited before message *k + 1* is sent, so the backend observes
//! editor messages in arrival order.
//!
//! The retry timer never touches session state itself; it only delivers
//! ticks that the driver loop funnels back through
//! [`ForwardingSession::trigger_initialize_retry`]. Every transition
//! completes, including timer cancel or arm, before the next await point.

use std::time::Duration;

use log::{debug, info};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::mpsc,
};

use crate::{
    codec::{FrameDecoder, encode_frame},
    error::{RelayError, Result},
    message::Message,
    retry::RetryTimer,
    transport::{Transport, TransportError},
};

/// Lifecycle of the backend connection.
///
/// Exactly one variant is active. A retry timer exists iff the state is
/// connecting or reconnecting; the handle lives inside those variants, so
/// replacing them cancels the timer (explicitly, and structurally on drop).
/// The state never reverts to `WaitingForEditor`.
enum ConnectionState {
    /// Initial state; no backend contact yet.
    WaitingForEditor,
    /// Handshake sent, awaiting acceptance; retry timer armed.
    ConnectingToServer {
        initialize: Message,
        retry: RetryTimer,
    },
    /// Handshake accepted at least once; steady-state forwarding. The
    /// handshake is retained solely for a future reconnect.
    ConnectedToServer { initialize: Message },
    /// The backend refused a forward after being connected; handshake
    /// retries are running again. Reached only from `ConnectedToServer`.
    ReconnectingToServer {
        initialize: Message,
        retry: RetryTimer,
    },
}

impl ConnectionState {
    fn phase(&self) -> ConnectionPhase {
        match self {
            Self::WaitingForEditor => ConnectionPhase::Waiting,
            Self::ConnectingToServer { .. } => ConnectionPhase::Connecting,
            Self::ConnectedToServer { .. } => ConnectionPhase::Connected,
            Self::ReconnectingToServer { .. } => ConnectionPhase::Reconnecting,
        }
    }
}

/// Observable connection phase, for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// No backend contact yet.
    Waiting,
    /// Handshake retries running, never accepted so far.
    Connecting,
    /// Steady-state forwarding.
    Connected,
    /// Handshake retries running after a refusal while connected.
    Reconnecting,
}

/// Session relaying editor messages to the backend transport.
pub struct ForwardingSession<T, W> {
    decoder: FrameDecoder,
    state: ConnectionState,
    transport: T,
    editor_out: W,
    retry_tx: mpsc::Sender<()>,
    retry_period: Duration,
}

impl<T, W> ForwardingSession<T, W>
where
    T: Transport,
    W: AsyncWrite + Unpin + Send,
{
    /// Construct a session in the `WaitingForEditor` state.
    ///
    /// `retry_tx` is the channel retry timers tick on; the driver loop owns
    /// the receiving end and funnels ticks back into
    /// [`trigger_initialize_retry`][Self::trigger_initialize_retry].
    #[must_use]
    pub fn new(
        transport: T,
        editor_out: W,
        retry_tx: mpsc::Sender<()>,
        retry_period: Duration,
        max_frame_length: usize,
    ) -> Self {
        Self {
            decoder: FrameDecoder::new(max_frame_length),
            state: ConnectionState::WaitingForEditor,
            transport,
            editor_out,
            retry_tx,
            retry_period,
        }
    }

    /// Decode `chunk` and forward every newly ready message in arrival
    /// order, awaiting each forward's outcome before starting the next.
    ///
    /// # Errors
    ///
    /// Propagates fatal framing, decode, transport, and editor-stream
    /// failures. Connection refusal is handled internally.
    pub async fn handle_incoming_data(&mut self, chunk: &[u8]) -> Result<()> {
        self.decoder.feed(chunk)?;
        while let Some(message) = self.decoder.take_next() {
            if let Err(error) = message.parsed() {
                return Err(RelayError::Decode(error.clone()));
            }
            self.classify(&message);
            self.forward(message).await?;
        }
        Ok(())
    }

    /// Re-send the buffered handshake through the normal forwarding path.
    ///
    /// Invoked solely by retry-timer ticks. A stale tick left in the
    /// channel after cancellation finds no retrying state and is ignored.
    ///
    /// # Errors
    ///
    /// Propagates fatal transport and editor-stream failures.
    pub async fn trigger_initialize_retry(&mut self) -> Result<()> {
        let initialize = match &self.state {
            ConnectionState::ConnectingToServer { initialize, .. }
            | ConnectionState::ReconnectingToServer { initialize, .. } => initialize.clone(),
            ConnectionState::WaitingForEditor | ConnectionState::ConnectedToServer { .. } => {
                return Ok(());
            }
        };
        debug!("retrying initialize handshake");
        self.forward(initialize).await
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> ConnectionPhase { self.state.phase() }

    /// Borrow the editor-side output sink.
    ///
    /// Test support; the sink there is an in-memory buffer.
    #[doc(hidden)]
    pub fn editor_output(&self) -> &W { &self.editor_out }

    /// The handshake begins the backend connection; everything else is
    /// opaque and forwarded as-is.
    fn classify(&mut self, message: &Message) {
        if matches!(self.state, ConnectionState::WaitingForEditor) && message.is_initialize() {
            info!("initialize received; connecting to backend");
            self.state = ConnectionState::ConnectingToServer {
                initialize: message.clone(),
                retry: RetryTimer::arm(self.retry_period, self.retry_tx.clone()),
            };
        }
    }

    /// Forward one message and apply the uniform outcome handling. Used for
    /// editor messages and timer-triggered handshake resends alike.
    async fn forward(&mut self, message: Message) -> Result<()> {
        let issued_while_waiting = matches!(self.state, ConnectionState::WaitingForEditor);

        match self.transport.send(message.raw().clone()).await {
            Ok(response) => {
                // A 204 completes the exchange without granting handshake
                // acceptance; retries keep running.
                if let Some(body) = response.body() {
                    if !issued_while_waiting {
                        self.editor_out.write_all(&encode_frame(body)).await?;
                        self.editor_out.flush().await?;
                    }
                    self.note_forward_success();
                }
                Ok(())
            }
            Err(TransportError::Refused(_)) => {
                self.note_connection_refused();
                Ok(())
            }
            Err(error) => Err(RelayError::Transport(error)),
        }
    }

    /// A body-bearing response while connecting or reconnecting marks
    /// handshake acceptance: cancel the retries and start forwarding.
    fn note_forward_success(&mut self) {
        // The placeholder is replaced before control returns; no await
        // point can observe it.
        let state = std::mem::replace(&mut self.state, ConnectionState::WaitingForEditor);
        self.state = match state {
            ConnectionState::ConnectingToServer { initialize, retry }
            | ConnectionState::ReconnectingToServer { initialize, retry } => {
                retry.cancel();
                info!("backend accepted the handshake; forwarding messages");
                ConnectionState::ConnectedToServer { initialize }
            }
            other => other,
        };
    }

    /// A refusal while connected re-enters the handshake retry cycle with
    /// the retained initialize message; the refused message itself is
    /// dropped. In every other state the refusal is absorbed: waiting has
    /// nothing to retry, and the connecting states already run a timer.
    fn note_connection_refused(&mut self) {
        let state = std::mem::replace(&mut self.state, ConnectionState::WaitingForEditor);
        self.state = match state {
            ConnectionState::ConnectedToServer { initialize } => {
                info!("backend refused a forward; reconnecting");
                let retry = RetryTimer::arm(self.retry_period, self.retry_tx.clone());
                ConnectionState::ReconnectingToServer { initialize, retry }
            }
            other => other,
        };
    }
}
