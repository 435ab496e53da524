//! Session types: the data structures that represent a player's connection.
//!
//! A "session" is the server's record of a logged-in player. It is
//! deliberately small: **who** the player is, and **how** to reach
//! them (the outbound queue). Everything else about the connection —
//! the socket, the read loop, the liveness clock — belongs to the
//! connection task that owns the session.
//!
//! Ownership matters here. The connection task holds the only `Arc`
//! strong count (besides transient clones handed out by lookups), so
//! when the connection dies, the session dies with it and its registry
//! entry expires on its own. Nothing has to race to clean up.

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;

use duelforge_protocol::{Message, PlayerId};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Timing knobs for the connection loop.
///
/// Defaults follow the protocol contract: a heartbeat every 30 seconds,
/// and a peer is presumed dead after 60 silent seconds (two missed
/// beats).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How often the server writes a `Heartbeat` frame.
    pub heartbeat_interval: Duration,

    /// How long a peer may stay silent — no frames of any kind —
    /// before its connection is closed. Checked on the heartbeat tick.
    pub idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A logged-in player's handle, as seen by the rest of the server.
///
/// Created at login, registered in the [`SessionRegistry`], and owned
/// by the connection task. Other layers only ever borrow it briefly
/// through a registry lookup to call [`send`](Session::send).
///
/// [`SessionRegistry`]: crate::SessionRegistry
#[derive(Debug)]
pub struct Session {
    /// The id minted for this player at login.
    pub player_id: PlayerId,

    /// The name the player logged in with. Display only — nothing is
    /// verified against it.
    pub username: String,

    /// The outbound queue. The connection task drains this and does
    /// the actual frame writes.
    outbound: UnboundedSender<Message>,
}

impl Session {
    pub fn new(
        player_id: PlayerId,
        username: impl Into<String>,
        outbound: UnboundedSender<Message>,
    ) -> Self {
        Self {
            player_id,
            username: username.into(),
            outbound,
        }
    }

    /// Queues a message for this player. Never blocks and never fails
    /// to the caller: if the connection task is already gone, the
    /// message is dropped and the fact logged at debug level — the
    /// registry entry will expire on its own.
    pub fn send(&self, message: Message) {
        if self.outbound.send(message).is_err() {
            tracing::debug!(
                player_id = %self.player_id,
                "dropping message for closed session"
            );
        }
    }

    /// Whether the connection task is still draining the queue.
    /// Only a hint — the task can exit right after this returns.
    pub fn is_open(&self) -> bool {
        !self.outbound.is_closed()
    }
}

// =========================================================================
// Tests
// =========================================================================
