//! Decoded LSP message values.
//!
//! A [`Message`] pairs the exact payload bytes received from the editor with
//! a best-effort structured decode. Forwarding uses the raw bytes so the
//! backend sees them byte-for-byte; the structured form is consulted only to
//! recognise the `initialize` handshake.

use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

/// Method name of the handshake that begins an LSP session.
pub const INITIALIZE_METHOD: &str = "initialize";

/// A syntactically complete frame whose payload is not valid JSON.
///
/// The frame is still consumed by the decoder, so framing keeps making
/// progress; the session treats the error as fatal because handshake
/// detection depends on decoding.
#[derive(Clone, Debug, Error)]
#[error("frame payload is not valid JSON: {0}")]
pub struct PayloadDecodeError(Arc<serde_json::Error>);

/// One decoded LSP message. Immutable after construction.
#[derive(Clone, Debug)]
pub struct Message {
    raw: Bytes,
    parsed: Result<Value, PayloadDecodeError>,
}

impl Message {
    /// Decode a frame payload.
    ///
    /// The raw bytes are retained verbatim; the structured decode is
    /// best-effort and recorded either way.
    #[must_use]
    pub fn decode(raw: Bytes) -> Self {
        let parsed =
            serde_json::from_slice(&raw).map_err(|error| PayloadDecodeError(Arc::new(error)));
        Self { raw, parsed }
    }

    /// The payload bytes exactly as received from the editor.
    #[must_use]
    pub fn raw(&self) -> &Bytes { &self.raw }

    /// The structured decode of the payload.
    pub fn parsed(&self) -> &Result<Value, PayloadDecodeError> { &self.parsed }

    /// Whether this message is the `initialize` handshake.
    ///
    /// An undecodable payload is never the handshake.
    #[must_use]
    pub fn is_initialize(&self) -> bool {
        self.parsed
            .as_ref()
            .ok()
            .and_then(|value| value.get("method"))
            .and_then(Value::as_str)
            == Some(INITIALIZE_METHOD)
    }
}
