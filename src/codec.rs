//! Incremental framing codec for the LSP wire protocol.
//!
//! The wire format is a header line `Content-Length: <N>` terminated by a
//! blank line (`\r\n\r\n`), followed by exactly `N` bytes of JSON payload.
//! [`FrameDecoder`] turns an arbitrary sequence of byte chunks into discrete
//! [`Message`]s, and [`encode_frame`] produces the same envelope for
//! editor-bound output.
//!
//! The decoder never consumes bytes it cannot fully interpret: a header
//! whose payload has not arrived yet is left in place and re-scanned on the
//! next feed, so the sequence of decoded messages is invariant under how the
//! input happens to be chunked.

use std::collections::VecDeque;

use bytes::{Buf, Bytes, BytesMut};
use thiserror::Error;

use crate::message::Message;

/// Prefix of the framing header line.
pub const HEADER_PREFIX: &[u8] = b"Content-Length: ";

/// Blank line terminating the framing header.
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Largest declared payload length accepted by default (16 MiB).
pub const MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Fatal framing failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The declared `Content-Length` exceeds the configured bound.
    #[error("declared frame length {declared} exceeds maximum {max}")]
    OversizedFrame {
        /// Length announced by the header.
        declared: usize,
        /// Configured bound.
        max: usize,
    },
}

/// A located framing header, relative to the start of the buffer.
struct HeaderMatch {
    /// Offset of the first payload byte.
    payload_start: usize,
    /// Declared payload length.
    content_length: usize,
}

/// Incremental decoder turning byte chunks into framed messages.
///
/// Chunks accumulate in a buffer consumed left-to-right; every frame that is
/// complete after a [`feed`][FrameDecoder::feed] is drained immediately into
/// a FIFO queue, preserving arrival order, before control returns to the
/// caller.
pub struct FrameDecoder {
    buffer: BytesMut,
    ready: VecDeque<Message>,
    max_frame_length: usize,
}

impl Default for FrameDecoder {
    fn default() -> Self { Self::new(MAX_FRAME_LENGTH) }
}

impl FrameDecoder {
    /// Construct a decoder accepting frames up to `max_frame_length` bytes.
    #[must_use]
    pub fn new(max_frame_length: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            ready: VecDeque::new(),
            max_frame_length,
        }
    }

    /// Append `chunk` and extract every complete frame it makes available.
    ///
    /// Multiple messages may arrive concatenated in one chunk; all of them
    /// are queued before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::OversizedFrame`] when a header declares a
    /// length beyond the configured bound.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<(), CodecError> {
        self.buffer.extend_from_slice(chunk);
        while self.try_consume_frame()? {}
        Ok(())
    }

    /// Whether at least one decoded message is ready to take.
    #[must_use]
    pub fn has_pending(&self) -> bool { !self.ready.is_empty() }

    /// Remove and return the oldest ready message, if any.
    pub fn take_next(&mut self) -> Option<Message> { self.ready.pop_front() }

    /// Try to slice one complete frame off the buffer.
    ///
    /// Returns `true` when a frame was consumed and the scan should run
    /// again. Nothing is consumed unless the full payload is present, so a
    /// partially received frame is re-scanned after the next feed.
    fn try_consume_frame(&mut self) -> Result<bool, CodecError> {
        let Some(header) = find_frame_header(&self.buffer) else {
            return Ok(false);
        };
        if header.content_length > self.max_frame_length {
            return Err(CodecError::OversizedFrame {
                declared: header.content_length,
                max: self.max_frame_length,
            });
        }
        let payload_end = header.payload_start + header.content_length;
        if self.buffer.len() < payload_end {
            return Ok(false);
        }

        // Bytes preceding the header match are unframed noise and leave the
        // buffer together with the consumed frame.
        let mut frame = self.buffer.split_to(payload_end);
        frame.advance(header.payload_start);
        self.ready.push_back(Message::decode(frame.freeze()));
        Ok(true)
    }
}

/// Frame `body` for the editor-side stream.
///
/// Produces `Content-Length: <len>\r\n\r\n<body>` byte-exact, with no
/// trailing separator beyond what the header specifies.
#[must_use]
pub fn encode_frame(body: &[u8]) -> Bytes {
    let header = format!("Content-Length: {}\r\n\r\n", body.len());
    let mut framed = BytesMut::with_capacity(header.len() + body.len());
    framed.extend_from_slice(header.as_bytes());
    framed.extend_from_slice(body);
    framed.freeze()
}

/// Locate the first complete `Content-Length: <N>\r\n\r\n` header in `buf`.
///
/// A prefix occurrence not followed by digits and the blank-line terminator
/// is skipped and the scan continues, mirroring a regex search over the
/// whole buffer. Returns `None` when no complete header is present yet.
fn find_frame_header(buf: &[u8]) -> Option<HeaderMatch> {
    let mut from = 0;
    while let Some(at) = find_subsequence(&buf[from..], HEADER_PREFIX) {
        let digits_start = from + at + HEADER_PREFIX.len();
        let digits_len = buf[digits_start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        let terminator_start = digits_start + digits_len;
        if digits_len > 0 && buf[terminator_start..].starts_with(HEADER_TERMINATOR) {
            // The digits are ASCII by construction; a value too large for
            // usize is mapped to usize::MAX so the oversize bound trips.
            let content_length = std::str::from_utf8(&buf[digits_start..terminator_start])
                .ok()
                .and_then(|digits| digits.parse().ok())
                .unwrap_or(usize::MAX);
            return Some(HeaderMatch {
                payload_start: terminator_start + HEADER_TERMINATOR.len(),
                content_length,
            });
        }
        from += at + 1;
    }
    None
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
