//! The closed set of messages that cross the wire.
//!
//! Every frame body is exactly one [`Message`]. The enum is internally
//! tagged — `#[serde(tag = "type")]` — so a frame body looks like:
//!
//! ```json
//! { "type": "LoginRequest", "username": "zhou", "password": "" }
//! ```
//!
//! Requests that can fail carry a `success` flag plus an optional
//! error string in their response; there is no separate error channel.
//! Fire-and-forget kinds (`GameAction`) have no response at all — a
//! rejected action is logged server-side and silently dropped.

use serde::{Deserialize, Serialize};

use crate::types::{CardKind, GameSnapshot, PlayerId, RoomId, RoomSummary, TurnPhase};

// ---------------------------------------------------------------------------
// Sub-vocabularies
// ---------------------------------------------------------------------------

/// What a `RoomRequest` asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomAction {
    /// Create a fresh room and be seated in it.
    Create,
    /// Join the room named by `room_id`.
    Join,
    /// Leave the room named by `room_id`.
    Leave,
}

/// A move made by the player whose turn it is.
///
/// `#[serde(tag = "kind")]` keeps the JSON flat:
/// `{ "kind": "PlayCard", "card": "Attack", "target": 1001 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum PlayerAction {
    /// Play a card from hand. `target` is required for attacks and
    /// ignored for heals; defends are never playable by hand.
    PlayCard {
        card: CardKind,
        target: Option<PlayerId>,
    },
    /// Pass the turn to the next seat.
    EndTurn,
}

// ---------------------------------------------------------------------------
// Message — the top-level wire enum
// ---------------------------------------------------------------------------

/// Every message that can appear in a frame, both directions.
///
/// Direction is by convention, not enforcement: `*Request` kinds flow
/// client→server, `*Response` and the `Game*` events flow
/// server→client, and `Heartbeat` flows both ways. A server receiving
/// a kind it doesn't serve just logs and drops it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    // -- Identity --
    /// Client → Server: "Here I am." Credentials are carried but not
    /// verified — login's only real job is to mint a player id.
    LoginRequest { username: String, password: String },

    /// Server → Client: the assigned id, or why there isn't one.
    LoginResponse {
        success: bool,
        player_id: Option<PlayerId>,
        error: Option<String>,
    },

    // -- Liveness --
    /// Either direction: "still here". Any inbound frame refreshes the
    /// peer's last-seen instant; this kind exists so quiet peers have
    /// something to send.
    Heartbeat,

    // -- Rooms --
    /// Client → Server: create, join, or leave a room.
    /// `room_id` is required for Join and Leave, ignored for Create.
    RoomRequest {
        action: RoomAction,
        room_id: Option<RoomId>,
    },

    /// Server → Client: outcome of a `RoomRequest`. On success
    /// `room_id` names the room (for Create, the freshly minted id).
    RoomResponse {
        success: bool,
        room_id: Option<RoomId>,
        error: Option<String>,
    },

    /// Client → Server: "show me all rooms."
    RoomListRequest,

    /// Server → Client: snapshot of every room, ascending by id.
    RoomListResponse { rooms: Vec<RoomSummary> },

    // -- Game --
    /// Client → Server: a move in the running game.
    GameAction { action: PlayerAction },

    /// Server → Client: a full state push with a human-readable log
    /// line. Broadcast to the room, or whispered to one player when
    /// the line is for their eyes (the defend prompt).
    GameState {
        phase: TurnPhase,
        state: GameSnapshot,
        log: String,
    },

    /// Server → Client: the room transitioned to Playing.
    /// `players` is the seating order, which is also the turn order.
    GameStart {
        room_id: RoomId,
        players: Vec<PlayerId>,
    },

    /// Server → Client: the game is over. Sent once, after the final
    /// `GameState`; the room is inert afterwards.
    GameOver { winner: PlayerId },
}

// =========================================================================
// Tests
// =========================================================================
