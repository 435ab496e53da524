//! Turn-based card-duel rules engine for Duelforge.
//!
//! Everything in this crate is synchronous and side-effect free: a
//! [`GameInstance`] is driven entirely by [`handle_action`] calls and
//! answers with an [`Outbox`] of messages for the caller to deliver.
//! The room layer owns the instance; the instance owns nothing.
//!
//! ```text
//!   duelforge-room ──▶ GameInstance::handle_action ──▶ Outbox
//!                         │
//!                         ├── GameRules   (tunable numbers)
//!                         └── standard_deck (card pool)
//! ```
//!
//! [`handle_action`]: GameInstance::handle_action

mod deck;
mod engine;
mod error;
mod rules;

pub use deck::standard_deck;
pub use engine::{GameInstance, Outbox};
pub use error::GameError;
pub use rules::GameRules;
