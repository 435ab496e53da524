//! Core protocol types for Duelforge's wire format.
//!
//! This module defines every type that travels "on the wire" — the
//! structures that get serialized into frame bodies, sent over TCP,
//! and deserialized on the other side — plus the small routing
//! vocabulary ([`Recipient`]) that the server layers share.
//!
//! Think of this as the "language" that the client and server speak.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player.
///
/// This is a newtype wrapper around `u64`. Why bother?
///
/// 1. **Type safety**: you can't accidentally pass a `RoomId` where a
///    `PlayerId` is expected, even though both are `u64` underneath.
/// 2. **Readability**: `fn whisper(target: PlayerId)` says more than
///    `fn whisper(target: u64)`.
///
/// The `#[serde(transparent)]` attribute tells serde to serialize this
/// as just the inner `u64`, not as a one-field struct. So PlayerId(42)
/// becomes `42` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

/// Display lets us use `{}` in format strings and logging.
/// `tracing::info!("{} joined", player_id)` prints "P-42 joined".
impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A unique identifier for a room (one table of the card game).
///
/// Same newtype pattern as `PlayerId`. Ids are allocated by the room
/// manager, monotonically, starting at 1000.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// The three card kinds in the deck.
///
/// The standard deck holds 30 attacks, 15 defends, and 8 heals.
/// Attack and heal are played proactively on your turn; defend is
/// never played by hand — it is consumed automatically when an attack
/// lands on you.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardKind {
    /// Deal 1 damage to a chosen opponent (unless they hold a defend).
    Attack,
    /// Cancels one incoming attack. Consumed reactively, never played.
    Defend,
    /// Restore 1 hp to yourself, capped at max hp.
    Heal,
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardKind::Attack => "attack",
            CardKind::Defend => "defend",
            CardKind::Heal => "heal",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Tags a `GameState` push with the point in the turn it describes.
///
/// Every turn start produces two pushes: one tagged `Draw` (right
/// after the current player drew), then one tagged `Play` (the turn
/// proper). Mid-turn outcome pushes are tagged `Play`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    Draw,
    Play,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnPhase::Draw => "draw",
            TurnPhase::Play => "play",
        };
        write!(f, "{name}")
    }
}

/// The lifecycle of a room.
///
/// Transitions only ever move forward:
///
/// ```text
/// Waiting ──► Choosing ──► Playing ──► Ended
///    └──────────────────────┘
///         (shortcut when a filling room starts straight away)
/// ```
///
/// `Waiting` rooms accept joins; `Playing` rooms host a live game;
/// `Ended` rooms are inert and wait for the sweeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Gathering players; joinable.
    Waiting,
    /// Players are seated and picking characters; still joinable.
    Choosing,
    /// A game is running.
    Playing,
    /// The game finished; the room is inert until swept.
    Ended,
}

impl RoomPhase {
    /// Can new players be seated in this phase?
    pub fn is_joinable(&self) -> bool {
        matches!(self, RoomPhase::Waiting | RoomPhase::Choosing)
    }

    /// Is a game currently running?
    pub fn is_active(&self) -> bool {
        matches!(self, RoomPhase::Playing)
    }

    /// Is `next` a legal forward step from this phase?
    ///
    /// The lifecycle is monotonic: no transition ever goes backwards,
    /// and a room never leaves `Ended`.
    pub fn can_transition_to(&self, next: RoomPhase) -> bool {
        matches!(
            (self, next),
            (RoomPhase::Waiting, RoomPhase::Choosing)
                | (RoomPhase::Waiting, RoomPhase::Playing)
                | (RoomPhase::Choosing, RoomPhase::Playing)
                | (RoomPhase::Playing, RoomPhase::Ended)
        )
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RoomPhase::Waiting => "waiting",
            RoomPhase::Choosing => "choosing",
            RoomPhase::Playing => "playing",
            RoomPhase::Ended => "ended",
        };
        write!(f, "{name}")
    }
}

// ---------------------------------------------------------------------------
// Recipient — who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server-emitted event.
///
/// The game engine returns a list of `(Recipient, Message)` pairs and
/// never touches a socket itself. The room manager routes each pair:
/// `All` through the room-wide broadcast, `Player` through a targeted
/// whisper that bypasses room membership.
///
/// This type never crosses the wire — it is routing metadata that is
/// stripped once the message reaches a session's outbound queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player seated in the room.
    All,
    /// One specific player (the whisper path).
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One player's visible state inside a `GameState` push.
///
/// Hands are public: the reference protocol hides nothing, so every
/// snapshot carries every hand. Clients that want hidden information
/// must filter on their side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub hp: u32,
    pub max_hp: u32,
    pub hand: Vec<CardKind>,
}

/// The full game state as pushed to clients.
///
/// `players` is in seating order, which is also the turn order —
/// clients can render the table directly from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Whose turn it is.
    pub current: PlayerId,
    /// All seated players, in seating order.
    pub players: Vec<PlayerSnapshot>,
}

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    /// The room's unique id.
    pub room_id: RoomId,
    /// Number of players currently seated.
    pub player_count: usize,
    /// Maximum players allowed.
    pub capacity: usize,
    /// Where the room is in its lifecycle.
    pub phase: RoomPhase,
}

// =========================================================================
// Tests
// =========================================================================
