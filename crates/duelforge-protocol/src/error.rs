//! Error types for the protocol layer.
//!
//! Each crate in Duelforge defines its own error enum. The split that
//! matters here is **framing vs parsing**: a framing error means the
//! byte stream itself is broken (truncated frame, absurd length
//! header), while a parse error means the frame arrived intact but its
//! body is not a message we recognize. Both are fatal for the
//! connection that produced them — and only for that connection.

use std::io;

/// Errors that can occur while encoding or decoding frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The buffer ends before the frame does.
    ///
    /// Either there are fewer than [`HEADER_LEN`](crate::HEADER_LEN)
    /// bytes, or the header promises more body bytes than were given.
    #[error("truncated frame: needed {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    /// The length header declares a body larger than the configured
    /// maximum. Treated as a framing error: no honest client sends
    /// frames this big, so the stream is garbage or hostile.
    #[error("oversize frame: {len} bytes exceeds limit of {max}")]
    Oversize { len: usize, max: usize },

    /// The frame arrived whole but its body is not valid JSON for any
    /// known message kind.
    #[error("parse failed: {0}")]
    Parse(serde_json::Error),

    /// Serialization of an outgoing message failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The underlying socket failed mid-frame.
    ///
    /// Required by `tokio_util::codec::Decoder`, which funnels I/O
    /// errors through the codec's error type.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
