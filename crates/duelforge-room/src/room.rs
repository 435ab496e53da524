//! A single game room: seats, phase, and the running game.
//!
//! A `Room` is a lock-guarded state machine, not a task. Every
//! operation takes the room's own mutex, does its check-then-act in
//! one critical section, and hands any resulting messages back to the
//! caller instead of sending them itself. Nothing under the lock ever
//! touches a session, so the lock is only held for a few loads and
//! stores.
//!
//! The phase lifecycle is monotonic:
//!
//! ```text
//! Waiting ──▶ Choosing ──▶ Playing ──▶ Ended
//!    └──────────────────────▲
//!     (room fills in one go)
//! ```
//!
//! Seating order is insertion order, and once the game starts it is
//! also the turn order. Seats of departed players close up without
//! reordering the rest.

use parking_lot::Mutex;

use duelforge_game::{GameInstance, GameRules, Outbox};
use duelforge_protocol::{
    Message, PlayerAction, PlayerId, Recipient, RoomId, RoomPhase, RoomSummary,
};

use crate::{RoomConfig, RoomError};

/// One room. Shared as `Arc<Room>`; all methods take `&self`.
pub struct Room {
    id: RoomId,
    config: RoomConfig,
    inner: Mutex<RoomInner>,
}

struct RoomInner {
    phase: RoomPhase,
    /// Seating order; doubles as turn order once the game starts.
    seats: Vec<PlayerId>,
    /// Present exactly while `phase == Playing` or `Ended`.
    game: Option<GameInstance>,
}

impl Room {
    pub fn new(id: RoomId, config: RoomConfig) -> Self {
        Self {
            id,
            config,
            inner: Mutex::new(RoomInner {
                phase: RoomPhase::Waiting,
                seats: Vec::new(),
                game: None,
            }),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    // -- Seating -----------------------------------------------------------

    /// Seats one player. Returns `true` when this join filled the last
    /// seat — the caller is expected to run the start sequence then.
    ///
    /// The fill signal can go stale if someone leaves before the
    /// caller acts on it; [`start_game`](Self::start_game) revalidates
    /// under the lock, so acting on a stale signal fails cleanly.
    pub fn add_player(&self, player_id: PlayerId) -> Result<bool, RoomError> {
        let mut inner = self.inner.lock();
        if !inner.phase.is_joinable() {
            return Err(RoomError::WrongPhase {
                room_id: self.id,
                phase: inner.phase,
            });
        }
        if inner.seats.contains(&player_id) {
            return Err(RoomError::AlreadyInRoom(player_id, self.id));
        }
        if inner.seats.len() >= self.config.capacity {
            return Err(RoomError::RoomFull(self.id));
        }

        inner.seats.push(player_id);
        tracing::info!(
            room_id = %self.id,
            %player_id,
            seated = inner.seats.len(),
            capacity = self.config.capacity,
            "player joined"
        );
        Ok(inner.seats.len() == self.config.capacity)
    }

    /// Seats a whole batch or none of it. Only `Waiting` rooms accept
    /// batches; this is the matchmaking primitive, where a group that
    /// queued together must land in the same room.
    ///
    /// Returns `true` when the batch filled the room.
    pub fn seat_batch(&self, batch: &[PlayerId]) -> Result<bool, RoomError> {
        let mut inner = self.inner.lock();
        if inner.phase != RoomPhase::Waiting {
            return Err(RoomError::WrongPhase {
                room_id: self.id,
                phase: inner.phase,
            });
        }
        if let Some(dup) =
            batch.iter().copied().find(|pid| inner.seats.contains(pid))
        {
            return Err(RoomError::AlreadyInRoom(dup, self.id));
        }
        if inner.seats.len() + batch.len() > self.config.capacity {
            return Err(RoomError::RoomFull(self.id));
        }

        inner.seats.extend_from_slice(batch);
        tracing::info!(
            room_id = %self.id,
            joined = batch.len(),
            seated = inner.seats.len(),
            capacity = self.config.capacity,
            "players seated"
        );
        Ok(inner.seats.len() == self.config.capacity)
    }

    /// Unseats a player. Allowed in any phase: a mid-game leaver stops
    /// receiving room traffic, while the engine keeps their seat in
    /// the turn order (the duel plays on without them).
    pub fn remove_player(&self, player_id: PlayerId) -> Result<(), RoomError> {
        let mut inner = self.inner.lock();
        let Some(index) = inner.seats.iter().position(|p| *p == player_id)
        else {
            return Err(RoomError::NotInRoom(player_id, self.id));
        };
        inner.seats.remove(index);
        tracing::info!(
            room_id = %self.id,
            %player_id,
            seated = inner.seats.len(),
            "player left"
        );
        Ok(())
    }

    // -- Lifecycle ---------------------------------------------------------

    /// Moves `Waiting → Choosing`. Needs at least two players seated;
    /// the room stays joinable until it actually starts.
    pub fn begin_choosing(&self) -> Result<(), RoomError> {
        let mut inner = self.inner.lock();
        if !inner.phase.can_transition_to(RoomPhase::Choosing) {
            return Err(RoomError::WrongPhase {
                room_id: self.id,
                phase: inner.phase,
            });
        }
        if inner.seats.len() < 2 {
            return Err(RoomError::NotEnoughSeated {
                room_id: self.id,
                seated: inner.seats.len(),
                need: 2,
            });
        }
        inner.phase = RoomPhase::Choosing;
        tracing::debug!(room_id = %self.id, "room entered choosing phase");
        Ok(())
    }

    /// Starts the duel. Requires every seat filled and a phase that
    /// can still move to `Playing`.
    ///
    /// Returns the announcement plus the engine's opening events; the
    /// caller dispatches them after this returns, with no lock held.
    pub fn start_game(&self, rules: &GameRules) -> Result<Outbox, RoomError> {
        let mut inner = self.inner.lock();
        if !inner.phase.can_transition_to(RoomPhase::Playing) {
            return Err(RoomError::WrongPhase {
                room_id: self.id,
                phase: inner.phase,
            });
        }
        if inner.seats.len() != self.config.capacity {
            return Err(RoomError::NotEnoughSeated {
                room_id: self.id,
                seated: inner.seats.len(),
                need: self.config.capacity,
            });
        }

        let (game, start_events) =
            GameInstance::start(&inner.seats, rules.clone())?;

        inner.phase = RoomPhase::Playing;
        let mut events: Outbox = Vec::with_capacity(start_events.len() + 1);
        events.push((
            Recipient::All,
            Message::GameStart {
                room_id: self.id,
                players: inner.seats.clone(),
            },
        ));
        events.extend(start_events);
        inner.game = Some(game);

        tracing::info!(
            room_id = %self.id,
            players = inner.seats.len(),
            "game started"
        );
        Ok(events)
    }

    /// Feeds one player action to the engine. Only legal while
    /// `Playing`; when the engine reports the duel over, the room
    /// moves to `Ended` in the same critical section.
    pub fn handle_action(
        &self,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<Outbox, RoomError> {
        let mut inner = self.inner.lock();
        if inner.phase != RoomPhase::Playing {
            return Err(RoomError::WrongPhase {
                room_id: self.id,
                phase: inner.phase,
            });
        }
        if !inner.seats.contains(&player_id) {
            return Err(RoomError::NotInRoom(player_id, self.id));
        }
        let Some(game) = inner.game.as_mut() else {
            return Err(RoomError::WrongPhase {
                room_id: self.id,
                phase: inner.phase,
            });
        };

        let events = game.handle_action(player_id, action)?;
        let finished = game.is_over();
        let winner = game.winner();
        if finished {
            inner.phase = RoomPhase::Ended;
            tracing::info!(room_id = %self.id, winner = ?winner, "game ended");
        }
        Ok(events)
    }

    // -- Views -------------------------------------------------------------

    /// Room metadata for listings.
    pub fn snapshot(&self) -> RoomSummary {
        let inner = self.inner.lock();
        RoomSummary {
            room_id: self.id,
            player_count: inner.seats.len(),
            capacity: self.config.capacity,
            phase: inner.phase,
        }
    }

    /// Current members in seating order.
    pub fn players(&self) -> Vec<PlayerId> {
        self.inner.lock().seats.clone()
    }

    pub fn player_count(&self) -> usize {
        self.inner.lock().seats.len()
    }

    pub fn phase(&self) -> RoomPhase {
        self.inner.lock().phase
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().seats.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
