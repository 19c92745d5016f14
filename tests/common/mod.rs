//! Shared utilities for integration tests.
//!
//! Provides a scripted in-memory [`Transport`] double and a frame-building
//! helper, so the state-machine tests can observe exactly what the session
//! sends and dictate each outcome.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{
    collections::VecDeque,
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use bytes::Bytes;
use lsp_relay::{
    codec::encode_frame,
    transport::{BackendResponse, Transport, TransportError},
};

pub const INITIALIZE: &[u8] = br#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#;
pub const DID_OPEN: &[u8] = br#"{"jsonrpc":"2.0","method":"textDocument/didOpen","params":{}}"#;

/// Scripted outcome of one backend exchange.
#[derive(Clone, Copy, Debug)]
pub enum Outcome {
    /// Complete the exchange with this status and body.
    Ok(u16, &'static [u8]),
    /// Fail with a connection-refused error.
    Refused,
    /// Fail with a non-refusal error.
    Fail,
}

/// Transport double that records every payload and replays a script of
/// outcomes. An exhausted script answers 204 No Content.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    sent: Mutex<Vec<Bytes>>,
}

impl ScriptedTransport {
    pub fn new(script: impl IntoIterator<Item = Outcome>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Every payload sent so far, in order.
    pub fn sent(&self) -> Vec<Bytes> { self.sent.lock().expect("sent lock poisoned").clone() }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, payload: Bytes) -> Result<BackendResponse, TransportError> {
        self.sent.lock().expect("sent lock poisoned").push(payload);
        let outcome = self
            .script
            .lock()
            .expect("script lock poisoned")
            .pop_front()
            .unwrap_or(Outcome::Ok(204, b""));
        match outcome {
            Outcome::Ok(status, body) => Ok(BackendResponse::new(status, Bytes::from_static(body))),
            Outcome::Refused => Err(TransportError::Refused(
                io::Error::from(io::ErrorKind::ConnectionRefused).into(),
            )),
            Outcome::Fail => Err(TransportError::Http(
                io::Error::other("backend unavailable").into(),
            )),
        }
    }
}

/// Frame `body` the way the editor would put it on the wire.
pub fn frame(body: &[u8]) -> Vec<u8> { encode_frame(body).to_vec() }
