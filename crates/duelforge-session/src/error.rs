//! Error types for the session layer.

/// Errors that can occur in the session registry.
///
/// Deliberately short. A failed lookup is `None`, not an error — a
/// session being gone is a normal fact of life here, and only a
/// genuine conflict gets an error variant.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A *live* session already holds this player id. With monotonic
    /// id allocation this means a caller registered twice, not an id
    /// collision.
    #[error("player {0} already has a live session")]
    AlreadyRegistered(duelforge_protocol::PlayerId),
}
