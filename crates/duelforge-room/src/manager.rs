//! Room manager: creates, tracks, and routes players to rooms.
//!
//! The manager owns the room table and a handle to the session
//! registry; rooms own their game instances; nothing points back up.
//! Two locks exist in this layer and they are always taken in the
//! same order: the table lock before any room's lock, never the
//! reverse, and never across a session send. Engine events are
//! dispatched only after every lock is released.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use duelforge_game::{GameRules, Outbox};
use duelforge_protocol::{
    Message, PlayerAction, PlayerId, Recipient, RoomId, RoomSummary,
};
use duelforge_session::SessionRegistry;

use crate::{Room, RoomConfig, RoomError};

/// First room id a manager hands out. Low numbers stay recognizable
/// as "not a real room" in logs and tests.
const FIRST_ROOM_ID: u64 = 1000;

struct RoomTable {
    /// Active rooms. A `BTreeMap` pins every scan and listing to
    /// ascending id order.
    rooms: BTreeMap<RoomId, Arc<Room>>,
    /// Guarded by the table lock along with the map, so ids are
    /// monotonic without a global counter.
    next_room_id: u64,
}

/// Creates rooms, seats players, and routes game traffic.
///
/// This is the entry point for room operations from higher layers
/// (connection handlers, the server accept loop). All methods are
/// synchronous; delivery happens through the session registry's
/// outbound queues.
pub struct RoomManager {
    config: RoomConfig,
    rules: GameRules,
    sessions: Arc<SessionRegistry>,
    table: Mutex<RoomTable>,
}

impl RoomManager {
    pub fn new(
        config: RoomConfig,
        rules: GameRules,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            config,
            rules,
            sessions,
            table: Mutex::new(RoomTable {
                rooms: BTreeMap::new(),
                next_room_id: FIRST_ROOM_ID,
            }),
        }
    }

    // -- Creation and seating ----------------------------------------------

    /// Creates a room seating `initial`, and returns its id. The room
    /// becomes visible to other calls only after the batch is seated,
    /// so nobody can slip into a half-built room.
    ///
    /// If the batch already fills the room the start sequence runs
    /// before this returns.
    pub fn create_room(
        &self,
        initial: &[PlayerId],
    ) -> Result<RoomId, RoomError> {
        self.validate_batch(initial)?;

        let id = {
            let mut table = self.table.lock();
            let id = RoomId(table.next_room_id);
            table.next_room_id += 1;
            id
        };

        let room = Arc::new(Room::new(id, self.config.clone()));
        let full = room.seat_batch(initial)?;
        self.table.lock().rooms.insert(id, Arc::clone(&room));
        tracing::info!(room_id = %id, seated = initial.len(), "room created");

        if full {
            self.start_room(&room);
        }
        Ok(id)
    }

    /// Seats a player in an existing room. Filling the last seat
    /// triggers the start sequence.
    pub fn join_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let room = self.room(room_id).ok_or(RoomError::NotFound(room_id))?;
        let full = room.add_player(player_id)?;
        if full {
            self.start_room(&room);
        }
        Ok(())
    }

    /// Unseats a player. An emptied room is left in the table; the
    /// sweeper owns deletion.
    pub fn leave_room(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
    ) -> Result<(), RoomError> {
        let room = self.room(room_id).ok_or(RoomError::NotFound(room_id))?;
        room.remove_player(player_id)
    }

    /// Matchmaking: seats the whole batch in one room, first fit.
    ///
    /// Rooms are scanned in ascending id order for a `Waiting` room
    /// with enough free seats; the batch lands in the first one that
    /// takes it, otherwise a fresh room is created around it. The scan
    /// holds the table lock so two concurrent matches cannot pick the
    /// same seats.
    pub fn match_players(
        &self,
        batch: &[PlayerId],
    ) -> Result<RoomId, RoomError> {
        self.validate_batch(batch)?;

        let seated = {
            let table = self.table.lock();
            table.rooms.values().find_map(|room| {
                // Any rejection (full, started, member overlap) just
                // means this room is not a fit.
                room.seat_batch(batch)
                    .ok()
                    .map(|full| (Arc::clone(room), full))
            })
        };

        match seated {
            Some((room, full)) => {
                tracing::debug!(
                    room_id = %room.id(),
                    batch = batch.len(),
                    "matched into existing room"
                );
                if full {
                    self.start_room(&room);
                }
                Ok(room.id())
            }
            None => self.create_room(batch),
        }
    }

    // -- Game traffic ------------------------------------------------------

    /// Routes one in-game action and delivers whatever the engine
    /// produced. Lock-free by the time anything is sent.
    pub fn handle_action(
        &self,
        room_id: RoomId,
        player_id: PlayerId,
        action: PlayerAction,
    ) -> Result<(), RoomError> {
        let room = self.room(room_id).ok_or(RoomError::NotFound(room_id))?;
        let events = room.handle_action(player_id, action)?;
        self.dispatch(room_id, events);
        Ok(())
    }

    /// Sends a message to every current member of a room. Members
    /// whose session is gone are skipped silently.
    pub fn broadcast(&self, room_id: RoomId, message: &Message) {
        let members = match self.room(room_id) {
            Some(room) => room.players(),
            None => return,
        };
        for player_id in members {
            self.whisper(player_id, message);
        }
    }

    /// Sends a message to one player, bypassing room membership.
    pub fn whisper(&self, player_id: PlayerId, message: &Message) {
        match self.sessions.lookup(player_id) {
            Some(session) => session.send(message.clone()),
            None => {
                tracing::debug!(%player_id, "no live session, message dropped")
            }
        }
    }

    /// Delivers engine events: `All` fans out to the room, `Player`
    /// goes point-to-point. Call with no locks held.
    pub fn dispatch(&self, room_id: RoomId, events: Outbox) {
        for (recipient, message) in events {
            match recipient {
                Recipient::All => self.broadcast(room_id, &message),
                Recipient::Player(pid) => self.whisper(pid, &message),
            }
        }
    }

    // -- Views and upkeep --------------------------------------------------

    /// All rooms, ascending by id.
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let table = self.table.lock();
        table.rooms.values().map(|room| room.snapshot()).collect()
    }

    /// Deletes every room with no members, in any phase, and returns
    /// the ids removed. Rooms with members are never touched here.
    pub fn sweep_empty(&self) -> Vec<RoomId> {
        let removed: Vec<RoomId> = {
            let mut table = self.table.lock();
            let empty: Vec<RoomId> = table
                .rooms
                .iter()
                .filter(|(_, room)| room.is_empty())
                .map(|(id, _)| *id)
                .collect();
            for id in &empty {
                table.rooms.remove(id);
            }
            empty
        };
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "swept empty rooms");
        }
        removed
    }

    /// Spawns the periodic sweeper task. Runs until aborted; the task
    /// holds its own `Arc` to the manager.
    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        let period = self.config.cleanup_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker
                .set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; the sweep should
            // wait a full period.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = self.sweep_empty();
                tracing::debug!(removed = removed.len(), "sweeper pass");
            }
        })
    }

    pub fn room_count(&self) -> usize {
        self.table.lock().rooms.len()
    }

    pub fn room(&self, room_id: RoomId) -> Option<Arc<Room>> {
        self.table.lock().rooms.get(&room_id).cloned()
    }

    // -- Internals ---------------------------------------------------------

    fn validate_batch(&self, batch: &[PlayerId]) -> Result<(), RoomError> {
        if batch.is_empty() {
            return Err(RoomError::EmptyBatch);
        }
        if batch.len() > self.config.capacity {
            return Err(RoomError::BatchTooLarge {
                got: batch.len(),
                capacity: self.config.capacity,
            });
        }
        if let Some(dup) = batch
            .iter()
            .enumerate()
            .find_map(|(i, pid)| batch[..i].contains(pid).then_some(*pid))
        {
            return Err(RoomError::DuplicateInBatch(dup));
        }
        Ok(())
    }

    /// Runs the start sequence on a freshly filled room and delivers
    /// its opening events.
    ///
    /// The fill signal this reacts to is advisory: a player can leave
    /// between the signal and this call, in which case `start_game`
    /// fails its own revalidation and the room simply keeps waiting.
    fn start_room(&self, room: &Room) {
        match room.start_game(&self.rules) {
            Ok(events) => self.dispatch(room.id(), events),
            Err(err) => {
                tracing::warn!(room_id = %room.id(), %err, "start sequence aborted")
            }
        }
    }
}
