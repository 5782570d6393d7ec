// src/core/protocol/frame.rs

//! Implements the wire frame structure and the corresponding `Encoder` and
//! `Decoder` for network communication.
//!
//! The wire format is newline-delimited JSON: one frame per line, each line a
//! JSON object with an `event` name and an optional `data` payload. It is
//! deliberately low-overhead and language-neutral, since the peers are
//! browser-session connectors.

use crate::core::RelayError;
use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

/// Protocol-level limit to prevent a single peer from ballooning the decode
/// buffer. A line longer than this is a protocol error.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024; // 1 MiB

/// A single application-level message exchanged between a connector and the
/// relay: a channel name plus an opaque payload. The payload schema is owned
/// by the persistence collaborator; the relay forwards it untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl WireFrame {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// A convenience method to encode a frame into `Bytes`.
    /// Useful where a frame is encoded once and fanned out to many peers.
    pub fn encode_to_bytes(&self) -> Result<Bytes, RelayError> {
        let mut buf = BytesMut::new();
        WireFrameCodec.encode(self.clone(), &mut buf)?;
        Ok(buf.freeze())
    }
}

/// A `tokio_util::codec` implementation for encoding and decoding
/// newline-delimited JSON `WireFrame`s.
#[derive(Debug)]
pub struct WireFrameCodec;

impl Encoder<WireFrame> for WireFrameCodec {
    type Error = RelayError;

    fn encode(&mut self, item: WireFrame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let encoded = serde_json::to_vec(&item)?;
        dst.reserve(encoded.len() + 1);
        dst.extend_from_slice(&encoded);
        dst.put_u8(b'\n');
        Ok(())
    }
}

impl Decoder for WireFrameCodec {
    type Item = WireFrame;
    type Error = RelayError;

    /// Decodes the next complete line from the buffer. Returns `Ok(None)` to
    /// signal that more data is needed; blank lines are skipped.
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = src.iter().position(|b| *b == b'\n') else {
                if src.len() > MAX_FRAME_SIZE {
                    return Err(RelayError::FrameTooLarge(MAX_FRAME_SIZE));
                }
                return Ok(None);
            };

            if pos > MAX_FRAME_SIZE {
                return Err(RelayError::FrameTooLarge(MAX_FRAME_SIZE));
            }

            let line = src.split_to(pos + 1);
            let line = trim_line(&line[..pos]);
            if line.is_empty() {
                continue;
            }

            let frame: WireFrame = serde_json::from_slice(line)?;
            return Ok(Some(frame));
        }
    }
}

/// Strips an optional trailing carriage return and surrounding whitespace so
/// peers that terminate lines with CRLF are accepted.
fn trim_line(line: &[u8]) -> &[u8] {
    let mut line = line;
    while let Some((first, rest)) = line.split_first() {
        if first.is_ascii_whitespace() {
            line = rest;
        } else {
            break;
        }
    }
    while let Some((last, rest)) = line.split_last() {
        if last.is_ascii_whitespace() {
            line = rest;
        } else {
            break;
        }
    }
    line
}
