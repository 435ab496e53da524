//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by every room a manager creates.
///
/// The classic duel is two players per room; raising `capacity` turns
/// the same code into the multi-seat variant (up to the table the UI
/// supports, typically 8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Seats per room. The game starts the moment the last seat fills.
    pub capacity: usize,

    /// How often the background sweeper deletes empty rooms.
    pub cleanup_interval: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 2,
            cleanup_interval: Duration::from_secs(300),
        }
    }
}
