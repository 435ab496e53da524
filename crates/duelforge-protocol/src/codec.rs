//! Length-prefixed framing over TCP.
//!
//! Every frame on the wire is:
//!
//! ```text
//! ┌──────────────┬─────────────────────────┐
//! │ length: u32  │ body: JSON Message      │
//! │ (big-endian) │ (exactly `length` bytes)│
//! └──────────────┴─────────────────────────┘
//! ```
//!
//! Two entry points:
//!
//! - [`encode`] / [`decode`] — one-shot helpers over a complete
//!   buffer. `decode` is the exact inverse of `encode`, and rejects
//!   anything short of a whole frame with a framing error.
//! - [`FrameCodec`] — the streaming [`Decoder`]/[`Encoder`] pair for
//!   `Framed<TcpStream, FrameCodec>`. In a stream, an incomplete
//!   frame is not an error — the codec simply waits for more bytes.
//!
//! The dividing line: when you hold the whole buffer, missing bytes
//! mean the frame was cut off; when you hold a socket, missing bytes
//! mean the rest is still in flight.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::ProtocolError;
use crate::message::Message;

/// Size of the length prefix, in bytes.
pub const HEADER_LEN: usize = 4;

/// Default cap on a frame body. Far beyond any legal message — the
/// biggest state push with eight full hands is well under a kilobyte —
/// so hitting this means a broken or hostile peer.
pub const DEFAULT_MAX_FRAME: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// One-shot helpers
// ---------------------------------------------------------------------------

/// Encodes a message into one complete frame (header + body).
///
/// # Errors
/// Returns `ProtocolError::Encode` if serialization fails.
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    let body = serde_json::to_vec(message).map_err(ProtocolError::Encode)?;
    let mut frame = Vec::with_capacity(HEADER_LEN + body.len());
    frame.extend_from_slice(&(body.len() as u32).to_be_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Decodes one complete frame from the front of `buf`.
///
/// Trailing bytes after the frame are ignored — callers that batch
/// frames should use [`FrameCodec`] instead.
///
/// # Errors
/// - `ProtocolError::Truncated` if `buf` is shorter than the header,
///   or shorter than the header plus the declared body length.
/// - `ProtocolError::Parse` if the body is not a valid message.
pub fn decode(buf: &[u8]) -> Result<Message, ProtocolError> {
    if buf.len() < HEADER_LEN {
        return Err(ProtocolError::Truncated {
            needed: HEADER_LEN,
            got: buf.len(),
        });
    }
    let mut header = [0u8; HEADER_LEN];
    header.copy_from_slice(&buf[..HEADER_LEN]);
    let body_len = u32::from_be_bytes(header) as usize;

    let total = HEADER_LEN + body_len;
    if buf.len() < total {
        return Err(ProtocolError::Truncated {
            needed: total,
            got: buf.len(),
        });
    }
    serde_json::from_slice(&buf[HEADER_LEN..total]).map_err(ProtocolError::Parse)
}

// ---------------------------------------------------------------------------
// FrameCodec — streaming Decoder/Encoder for Framed
// ---------------------------------------------------------------------------

/// Streaming codec for use with `tokio_util::codec::Framed`.
///
/// Accumulates bytes until a whole frame is present, then yields the
/// parsed [`Message`]. Frames larger than `max_frame` are rejected
/// before any allocation happens for them; the connection should be
/// dropped on that error.
#[derive(Debug, Clone)]
pub struct FrameCodec {
    max_frame: usize,
}

impl FrameCodec {
    pub fn new() -> Self {
        Self {
            max_frame: DEFAULT_MAX_FRAME,
        }
    }

    /// A codec with a non-default frame cap. Tests use tiny caps to
    /// exercise the oversize path without allocating real buffers.
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self { max_frame }
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for FrameCodec {
    type Item = Message;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>, ProtocolError> {
        // Not even a full header yet.
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        // Peek the length without consuming it, so a partial body
        // leaves the buffer untouched for the next call.
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&src[..HEADER_LEN]);
        let body_len = u32::from_be_bytes(header) as usize;

        if body_len > self.max_frame {
            return Err(ProtocolError::Oversize {
                len: body_len,
                max: self.max_frame,
            });
        }

        if src.len() < HEADER_LEN + body_len {
            // Reserve what the rest of the frame will need; one
            // allocation instead of several as bytes trickle in.
            src.reserve(HEADER_LEN + body_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let body = src.split_to(body_len);
        let message = serde_json::from_slice(&body).map_err(ProtocolError::Parse)?;
        Ok(Some(message))
    }
}

impl Encoder<Message> for FrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let body = serde_json::to_vec(&item).map_err(ProtocolError::Encode)?;
        if body.len() > self.max_frame {
            return Err(ProtocolError::Oversize {
                len: body.len(),
                max: self.max_frame,
            });
        }
        dst.reserve(HEADER_LEN + body.len());
        dst.put_u32(body.len() as u32);
        dst.put_slice(&body);
        Ok(())
    }
}

// =========================================================================
// Tests
// =========================================================================
