//! # Duelforge
//!
//! A multiplayer card-duel server over plain TCP.
//!
//! Duelforge is server-authoritative: clients send requests and
//! actions, the server owns every rule. The layers stack bottom-up:
//!
//! - [`duelforge_protocol`] — length-prefixed JSON frames and the
//!   message vocabulary
//! - [`duelforge_session`] — player identity and per-player delivery
//!   queues
//! - [`duelforge_game`] — the duel engine, a pure state machine
//! - [`duelforge_room`] — room lifecycle, matchmaking, and fan-out
//! - this crate — the TCP accept loop and per-connection handlers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use duelforge::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), DuelforgeError> {
//!     let server = DuelforgeServer::builder()
//!         .bind("0.0.0.0:9527")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::DuelforgeError;
pub use server::{DuelforgeServer, DuelforgeServerBuilder, ServerConfig};

/// One-stop imports for embedding or driving a server.
pub mod prelude {
    pub use crate::{DuelforgeError, DuelforgeServer, DuelforgeServerBuilder, ServerConfig};
    pub use duelforge_game::{GameError, GameRules};
    pub use duelforge_protocol::{
        CardKind, FrameCodec, GameSnapshot, Message, PlayerAction, PlayerId, PlayerSnapshot,
        RoomAction, RoomId, RoomPhase, RoomSummary, TurnPhase,
    };
    pub use duelforge_room::{RoomConfig, RoomError};
    pub use duelforge_session::SessionConfig;
}
