//! Wire protocol for Duelforge.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Types** ([`PlayerId`], [`CardKind`], [`RoomPhase`], etc.) —
//!   the vocabulary that appears inside messages.
//! - **Messages** ([`Message`]) — the closed set of frames either side
//!   can send.
//! - **Codec** ([`encode`]/[`decode`], [`FrameCodec`]) — the 4-byte
//!   big-endian length prefix that turns a TCP byte stream into
//!   discrete frames.
//! - **Errors** ([`ProtocolError`]) — framing vs parse failures.
//!
//! # Architecture
//!
//! The protocol layer sits between the socket (raw bytes) and the
//! session layer (player identity). It doesn't know about connections
//! or rooms — it only knows how to frame and parse messages.
//!
//! ```text
//! TcpStream (bytes) → FrameCodec (Message) → Session (player context)
//! ```

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod error;
mod message;
mod types;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

// `pub use` flattens the public API to the crate root: callers write
// `use duelforge_protocol::Message`, not `...::message::Message`.

pub use codec::{DEFAULT_MAX_FRAME, FrameCodec, HEADER_LEN, decode, encode};
pub use error::ProtocolError;
pub use message::{Message, PlayerAction, RoomAction};
pub use types::{
    CardKind, GameSnapshot, PlayerId, PlayerSnapshot, Recipient, RoomId,
    RoomPhase, RoomSummary, TurnPhase,
};
