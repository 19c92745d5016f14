//! Backend transport seam.
//!
//! The session forwards every editor message through a [`Transport`]; the
//! production implementation POSTs the payload as JSON to a fixed HTTP
//! endpoint. Connection refusal is the one failure the session recovers
//! from, so the transport must report it distinctly from every other error.

use std::{io, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// Boxed error type carried inside [`TransportError`] variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// HTTP status signalling "no body to relay".
pub const NO_CONTENT: u16 = 204;

/// Transport failures, split by how the session reacts to them.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The backend is not currently accepting connections. Recovered
    /// locally via the retry cycle; never surfaced to the editor.
    #[error("backend refused the connection")]
    Refused(#[source] BoxError),
    /// Any other client-side failure (DNS, timeout, broken response).
    /// Fatal to the relay.
    #[error("backend request failed")]
    Http(#[source] BoxError),
}

/// Outcome of a completed backend exchange.
#[derive(Clone, Debug)]
pub struct BackendResponse {
    status: u16,
    body: Bytes,
}

impl BackendResponse {
    /// Construct a response from its HTTP status and body bytes.
    #[must_use]
    pub fn new(status: u16, body: Bytes) -> Self { Self { status, body } }

    /// The HTTP status returned by the backend.
    #[must_use]
    pub fn status(&self) -> u16 { self.status }

    /// The body to relay back to the editor, or `None` when the backend
    /// answered 204 No Content.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> { (self.status != NO_CONTENT).then_some(&self.body) }
}

/// Capability to deliver one payload to the backend and observe the result.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver `payload` and await the backend's response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Refused`] when the backend is not
    /// accepting connections, and [`TransportError::Http`] for every other
    /// failure.
    async fn send(&self, payload: Bytes) -> Result<BackendResponse, TransportError>;
}

/// A shared handle forwards to the underlying transport, so callers that
/// keep a reference for inspection can hand the same transport to a session.
#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, payload: Bytes) -> Result<BackendResponse, TransportError> {
        self.as_ref().send(payload).await
    }
}

/// HTTP POST transport against a fixed backend endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// Construct a transport posting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, payload: Bytes) -> Result<BackendResponse, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|error| TransportError::Http(error.into()))?;
        Ok(BackendResponse::new(status, body))
    }
}

/// Split connection refusal out from every other request failure.
///
/// `reqwest` folds refusal into its generic connect error, so the
/// underlying `io::Error` kind is recovered by walking the source chain.
/// DNS failures and timeouts carry other kinds and stay fatal.
fn classify_send_error(error: reqwest::Error) -> TransportError {
    if is_connection_refused(&error) {
        TransportError::Refused(error.into())
    } else {
        TransportError::Http(error.into())
    }
}

fn is_connection_refused(error: &(dyn std::error::Error + 'static)) -> bool {
    let mut source = error.source();
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            if io_error.kind() == io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
