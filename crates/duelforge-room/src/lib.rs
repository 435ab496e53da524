//! Room lifecycle and matchmaking for Duelforge.
//!
//! Rooms are lock-guarded state machines owned by a [`RoomManager`];
//! the manager also holds the session registry handle it needs to
//! deliver game traffic. Ownership runs strictly downward:
//!
//! ```text
//! RoomManager ──▶ Room ──▶ GameInstance
//!      │
//!      └──▶ SessionRegistry (delivery only)
//! ```
//!
//! # Key types
//!
//! - [`RoomManager`] — creates/sweeps rooms, seats players, routes game traffic
//! - [`Room`] — one table: seats, phase, and the running game
//! - [`RoomConfig`] — capacity and sweeper cadence
//! - [`RoomError`] — what can go wrong and for whom

mod config;
mod error;
mod manager;
mod room;

pub use config::RoomConfig;
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::Room;
