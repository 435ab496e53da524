//! Unified error type for the Duelforge server.

use duelforge_game::GameError;
use duelforge_protocol::ProtocolError;
use duelforge_room::RoomError;
use duelforge_session::SessionError;

/// Top-level error that wraps all crate-specific errors.
///
/// When embedding the `duelforge` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DuelforgeError {
    /// A protocol-level error (framing, encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (registration).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (full, not found, wrong phase).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game-rule error (out of turn, bad card, bad target).
    #[error(transparent)]
    Game(#[from] GameError),

    /// A socket-level error from the listener or a connection.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use duelforge_protocol::{PlayerId, RoomId};

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::Oversize {
            len: 1_000_000,
            max: 65_536,
        };
        let duel_err: DuelforgeError = err.into();
        assert!(matches!(duel_err, DuelforgeError::Protocol(_)));
        assert!(duel_err.to_string().contains("65536"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::AlreadyRegistered(PlayerId(1000));
        let duel_err: DuelforgeError = err.into();
        assert!(matches!(duel_err, DuelforgeError::Session(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err = RoomError::NotFound(RoomId(1000));
        let duel_err: DuelforgeError = err.into();
        assert!(matches!(duel_err, DuelforgeError::Room(_)));
        assert!(duel_err.to_string().contains("R-1000"));
    }

    #[test]
    fn test_from_game_error() {
        let err = GameError::NotYourTurn(PlayerId(1001));
        let duel_err: DuelforgeError = err.into();
        assert!(matches!(duel_err, DuelforgeError::Game(_)));
    }

    #[test]
    fn test_from_io_error() {
        let err = std::io::Error::other("socket gone");
        let duel_err: DuelforgeError = err.into();
        assert!(matches!(duel_err, DuelforgeError::Io(_)));
        assert!(duel_err.to_string().contains("socket gone"));
    }
}
