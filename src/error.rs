//! Canonical error and result types for the relay.
//!
//! Only fatal failures appear here. Framing-incomplete is not an error (the
//! decoder simply yields nothing yet), and connection refusal is absorbed by
//! the session's retry cycle without ever reaching this surface.

use thiserror::Error;

use crate::{codec::CodecError, message::PayloadDecodeError, transport::TransportError};

/// Top-level error surface of the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Fatal framing failure on the editor stream.
    #[error(transparent)]
    Codec(#[from] CodecError),
    /// A complete frame whose payload is not valid JSON.
    #[error(transparent)]
    Decode(#[from] PayloadDecodeError),
    /// A non-refusal backend failure.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Editor stream read or write failure.
    #[error("editor stream error: {0}")]
    Io(#[from] std::io::Error),
}

/// Canonical result alias used by the relay's public APIs.
pub type Result<T> = std::result::Result<T, RelayError>;
