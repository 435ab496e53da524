//! Error types for the room layer.

use duelforge_game::GameError;
use duelforge_protocol::{PlayerId, RoomId, RoomPhase};

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never did, or already swept).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// Every seat is taken.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The player is already seated in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomId),

    /// The player is not seated in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomId),

    /// The room's current phase does not allow this operation, e.g.
    /// joining once the game is underway.
    #[error("room {room_id} does not allow this in phase {phase}")]
    WrongPhase { room_id: RoomId, phase: RoomPhase },

    /// Too few players seated for the requested transition.
    #[error("room {room_id} has {seated} players seated, needs {need}")]
    NotEnoughSeated {
        room_id: RoomId,
        seated: usize,
        need: usize,
    },

    /// A create or match call with nobody in it.
    #[error("player batch is empty")]
    EmptyBatch,

    /// The batch can never fit in one room.
    #[error("batch of {got} players exceeds room capacity {capacity}")]
    BatchTooLarge { got: usize, capacity: usize },

    /// The same player appears more than once in a batch.
    #[error("player {0} appears twice in the batch")]
    DuplicateInBatch(PlayerId),

    /// The rules engine rejected an in-game action.
    #[error(transparent)]
    Game(#[from] GameError),
}
