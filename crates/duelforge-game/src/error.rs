//! Error types for the rules engine.

use duelforge_protocol::{CardKind, PlayerId};

/// Why an action was rejected (or a game couldn't start).
///
/// Every variant leaves the game state untouched. None of these are
/// wire errors — the server logs them and drops the offending action,
/// since `GameAction` has no response kind.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A duel needs at least two seats.
    #[error("not enough players to start: got {got}, need at least 2")]
    NotEnoughPlayers { got: usize },

    /// The game already ended; the state is frozen.
    #[error("game is already over")]
    Finished,

    /// The actor was never seated in this game.
    #[error("player {0} is not in this game")]
    NotInGame(PlayerId),

    /// The actor is at 0 hp and can no longer act.
    #[error("player {0} is eliminated")]
    Eliminated(PlayerId),

    /// It is someone else's turn.
    #[error("it is not player {0}'s turn")]
    NotYourTurn(PlayerId),

    /// An attack needs a target.
    #[error("attack requires a target")]
    TargetRequired,

    /// The target is the actor themselves, unseated, or already at
    /// 0 hp.
    #[error("invalid target {0}")]
    InvalidTarget(PlayerId),

    /// The actor doesn't hold the card they tried to play.
    #[error("no {0} card in hand")]
    CardNotInHand(CardKind),

    /// The card can never be played proactively (defend cards resolve
    /// reactively when an attack lands).
    #[error("{0} cards cannot be played directly")]
    CardNotPlayable(CardKind),

    /// Heal is only legal below max hp.
    #[error("player {0} is already at full hp")]
    AlreadyAtFullHp(PlayerId),
}
