//! The session registry: player id → live session.
//!
//! This is the one shared map in the identity layer. It answers a
//! single question — "is P-1042 reachable right now, and if so, hand
//! me their queue" — for the room manager's broadcasts and whispers.
//!
//! # Ownership and liveness
//!
//! The registry stores `Weak<Session>`, not `Arc<Session>`. The strong
//! count lives with the connection task. The consequences are exactly
//! what we want:
//!
//! - a connection that dies without unregistering leaves a stale entry
//!   that upgrades to `None` — absence, not a dangling session;
//! - `lookup` prunes such entries as it finds them, so the map never
//!   accumulates corpses;
//! - nobody can keep a player alive by holding the registry.
//!
//! # Concurrency
//!
//! One `parking_lot::Mutex` guards the map. Every critical section is
//! a handful of map operations — the lock is never held across a send,
//! an await, or any other registry's lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use duelforge_protocol::PlayerId;

use crate::{Session, SessionError};

/// Player ids are minted from here, monotonically. The reference
/// implementation drew random ids in [1000, 10000); a counter keeps
/// the range's shape and adds uniqueness for free.
const FIRST_PLAYER_ID: u64 = 1000;

/// Tracks every logged-in player.
///
/// Explicitly constructed — there is no global instance. The server
/// builds one, wraps it in an `Arc`, and hands clones to whoever needs
/// lookups (the room manager, the connection handlers).
pub struct SessionRegistry {
    /// Live sessions by player id. Values are weak: see module docs.
    entries: Mutex<HashMap<PlayerId, Weak<Session>>>,

    /// The next player id to mint.
    next_id: AtomicU64,
}

impl SessionRegistry {
    /// Creates an empty registry. Ids start at 1000.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(FIRST_PLAYER_ID),
        }
    }

    /// Mints a fresh player id. Unique for this registry's lifetime.
    pub fn allocate_id(&self) -> PlayerId {
        PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a session under its player id.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyRegistered`] if a *live* session
    /// already holds the id. A dead leftover entry is replaced
    /// silently — that player is gone, their id slot is not.
    pub fn register(&self, session: &Arc<Session>) -> Result<(), SessionError> {
        let player_id = session.player_id;
        let mut entries = self.entries.lock();

        if let Some(existing) = entries.get(&player_id) {
            if existing.upgrade().is_some() {
                return Err(SessionError::AlreadyRegistered(player_id));
            }
        }

        entries.insert(player_id, Arc::downgrade(session));
        tracing::info!(%player_id, username = %session.username, "session registered");
        Ok(())
    }

    /// Removes a player's entry. Returns `false` when there was none —
    /// teardown paths call this unconditionally, and a second call (or
    /// a call racing a prune) must be harmless.
    pub fn unregister(&self, player_id: PlayerId) -> bool {
        let removed = self.entries.lock().remove(&player_id).is_some();
        if removed {
            tracing::info!(%player_id, "session unregistered");
        }
        removed
    }

    /// Resolves a player id to a live session.
    ///
    /// Returns `None` for unknown ids *and* for entries whose session
    /// has died — graceful expiry, not an error. Dead entries are
    /// pruned on the spot.
    pub fn lookup(&self, player_id: PlayerId) -> Option<Arc<Session>> {
        let mut entries = self.entries.lock();
        match entries.get(&player_id) {
            Some(weak) => match weak.upgrade() {
                Some(session) => Some(session),
                None => {
                    entries.remove(&player_id);
                    None
                }
            },
            None => None,
        }
    }

    /// Number of live sessions. Prunes dead entries as it counts.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        entries.retain(|_, weak| weak.strong_count() > 0);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionRegistry`.
    //!
    //! Naming convention: `test_{function}_{scenario}_{expected}`.
    //!
    //! The interesting cases all revolve around the weak-ref contract:
    //! what happens when the connection task's `Arc` is dropped while
    //! the registry entry is still in the map.

    use super::*;
    use duelforge_protocol::Message;
    use tokio::sync::mpsc;

    // -- Helpers ----------------------------------------------------------

    fn pid(id: u64) -> PlayerId {
        PlayerId(id)
    }

    /// A session whose queue nobody drains. Good enough for registry
    /// tests, which never deliver anything.
    fn session(id: u64) -> Arc<Session> {
        let (tx, rx) = mpsc::unbounded_channel::<Message>();
        // Leak the receiver so the queue stays open for is_open checks.
        std::mem::forget(rx);
        Arc::new(Session::new(pid(id), format!("player-{id}"), tx))
    }

    // =====================================================================
    // allocate_id()
    // =====================================================================

    #[test]
    fn test_allocate_id_starts_at_1000() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.allocate_id(), pid(1000));
    }

    #[test]
    fn test_allocate_id_is_monotonic_and_unique() {
        let registry = SessionRegistry::new();
        let a = registry.allocate_id();
        let b = registry.allocate_id();
        let c = registry.allocate_id();
        assert_eq!((a, b, c), (pid(1000), pid(1001), pid(1002)));
    }

    // =====================================================================
    // register() / lookup()
    // =====================================================================

    #[test]
    fn test_register_then_lookup_returns_session() {
        let registry = SessionRegistry::new();
        let s = session(1000);

        registry.register(&s).expect("should register");

        let found = registry.lookup(pid(1000)).expect("should resolve");
        assert_eq!(found.player_id, pid(1000));
    }

    #[test]
    fn test_register_duplicate_live_id_returns_error() {
        let registry = SessionRegistry::new();
        let first = session(1000);
        let second = session(1000);

        registry.register(&first).unwrap();
        let result = registry.register(&second);

        assert!(matches!(
            result,
            Err(SessionError::AlreadyRegistered(p)) if p == pid(1000)
        ));
    }

    #[test]
    fn test_register_over_dead_entry_succeeds() {
        // The old session died without unregistering. A new session
        // with the same id must be able to take the slot.
        let registry = SessionRegistry::new();
        let old = session(1000);
        registry.register(&old).unwrap();
        drop(old);

        let fresh = session(1000);
        registry
            .register(&fresh)
            .expect("dead entry should be replaceable");
        assert!(registry.lookup(pid(1000)).is_some());
    }

    #[test]
    fn test_lookup_unknown_id_returns_none() {
        let registry = SessionRegistry::new();
        assert!(registry.lookup(pid(9999)).is_none());
    }

    #[test]
    fn test_lookup_after_session_dropped_returns_none() {
        // The graceful-expiry contract: a dead session reads as
        // absent, never as an error.
        let registry = SessionRegistry::new();
        let s = session(1000);
        registry.register(&s).unwrap();

        drop(s);

        assert!(registry.lookup(pid(1000)).is_none());
        // And the dead entry was pruned, so the slot is truly free.
        assert_eq!(registry.len(), 0);
    }

    // =====================================================================
    // unregister()
    // =====================================================================

    #[test]
    fn test_unregister_removes_entry() {
        let registry = SessionRegistry::new();
        let s = session(1000);
        registry.register(&s).unwrap();

        assert!(registry.unregister(pid(1000)));
        assert!(registry.lookup(pid(1000)).is_none());
    }

    #[test]
    fn test_unregister_unknown_id_returns_false() {
        let registry = SessionRegistry::new();
        assert!(!registry.unregister(pid(1000)));
    }

    #[test]
    fn test_unregister_is_idempotent() {
        // Teardown paths call unregister unconditionally; a double
        // call must be harmless.
        let registry = SessionRegistry::new();
        let s = session(1000);
        registry.register(&s).unwrap();

        assert!(registry.unregister(pid(1000)));
        assert!(!registry.unregister(pid(1000)));
    }

    // =====================================================================
    // len()
    // =====================================================================

    #[test]
    fn test_len_counts_only_live_sessions() {
        let registry = SessionRegistry::new();
        let alive = session(1000);
        let doomed = session(1001);
        registry.register(&alive).unwrap();
        registry.register(&doomed).unwrap();
        assert_eq!(registry.len(), 2);

        drop(doomed);

        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}
