//! Player session management for Duelforge.
//!
//! This crate handles the identity side of a connection:
//!
//! 1. **Identity** — minting player ids at login ([`SessionRegistry::allocate_id`])
//! 2. **Reachability** — resolving an id to a live outbound queue
//!    ([`SessionRegistry::lookup`] → [`Session::send`])
//! 3. **Liveness policy** — the heartbeat/idle knobs ([`SessionConfig`])
//!    that the connection loop enforces
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← resolves players to sessions for broadcasts
//!     ↕
//! Session Layer (this crate)  ← player identity and reachability
//!     ↕
//! Protocol Layer (below)  ← provides PlayerId and Message types
//! ```
//!
//! The actual socket handling lives in the server crate; this crate
//! never touches I/O beyond pushing onto an in-memory queue.

mod error;
mod registry;
mod session;

pub use error::SessionError;
pub use registry::SessionRegistry;
pub use session::{Session, SessionConfig};
