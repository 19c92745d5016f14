//! Public API for the `lsp-relay` library.
//!
//! Building blocks for relaying LSP traffic between an editor byte stream
//! and an HTTP backend: an incremental `Content-Length` framing codec, the
//! connection-lifecycle state machine that forwards each message, and the
//! cancellable retry timer that re-issues the `initialize` handshake until
//! the backend accepts it.

pub mod codec;
pub mod error;
pub mod message;
pub mod relay;
pub mod retry;
pub mod session;
pub mod transport;

pub use codec::{CodecError, FrameDecoder, encode_frame};
pub use error::{RelayError, Result};
pub use message::{Message, PayloadDecodeError};
pub use relay::{Relay, RelayConfig};
pub use retry::RetryTimer;
pub use session::{ConnectionPhase, ForwardingSession};
pub use transport::{BackendResponse, HttpTransport, Transport, TransportError};
