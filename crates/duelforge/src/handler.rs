//! Per-connection handler: login, heartbeats, and message routing.
//!
//! Each accepted socket gets its own Tokio task running this handler.
//! The flow is:
//!   1. Frames arrive unauthenticated; only `LoginRequest` and the
//!      read-only `RoomListRequest` do anything
//!   2. Login mints a `PlayerId` and registers the session
//!   3. Loop: inbound frames, queued outbound messages, heartbeat ticks
//!   4. On any exit the drop guard unseats and unregisters the player

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_util::codec::Framed;

use duelforge_protocol::{FrameCodec, Message, PlayerId, RoomAction, RoomId};
use duelforge_session::Session;

use crate::server::ServerState;
use crate::DuelforgeError;

/// Drop guard that cleans up a player's server-side footprint when the
/// handler exits: unseats them from their room and unregisters the
/// session. Runs on every exit path, including panics.
///
/// The guard also carries the connection's current room. Keeping it
/// next to the cleanup means routing and teardown can never disagree
/// about where the player is seated.
struct ConnectionGuard {
    player_id: PlayerId,
    room: Option<RoomId>,
    state: Arc<ServerState>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(room_id) = self.room {
            if let Err(e) = self.state.rooms.leave_room(room_id, self.player_id) {
                tracing::debug!(
                    player_id = %self.player_id,
                    error = %e,
                    "room cleanup on disconnect failed"
                );
            }
        }
        self.state.sessions.unregister(self.player_id);
        tracing::info!(player_id = %self.player_id, "session closed");
    }
}

/// Connection-local state that exists only after a successful login.
struct Established {
    session: Arc<Session>,
    /// Receiving half of the session's outbound queue; the connection
    /// loop drains it into the socket.
    outbound: UnboundedReceiver<Message>,
    guard: ConnectionGuard,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<ServerState>,
) -> Result<(), DuelforgeError> {
    tracing::debug!(%peer, "handling new connection");

    let mut framed = Framed::new(stream, FrameCodec::new());

    let mut heartbeat = tokio::time::interval(state.config.session.heartbeat_interval);
    heartbeat.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; a peer should not be
    // greeted with a heartbeat the instant it connects.
    heartbeat.tick().await;

    let idle_timeout = state.config.session.idle_timeout;
    let mut last_seen = Instant::now();
    let mut conn: Option<Established> = None;

    loop {
        tokio::select! {
            inbound = framed.next() => {
                let message = match inbound {
                    Some(Ok(message)) => message,
                    Some(Err(e)) => {
                        // Framing and parse errors are both fatal for
                        // the peer; resynchronizing a length-prefixed
                        // stream after a bad frame is guesswork.
                        tracing::debug!(%peer, error = %e, "bad frame, closing connection");
                        break;
                    }
                    None => {
                        tracing::debug!(%peer, "connection closed by peer");
                        break;
                    }
                };
                last_seen = Instant::now();
                handle_message(&state, &mut framed, &mut conn, peer, message).await?;
            }

            Some(message) = queued(&mut conn) => {
                framed.send(message).await?;
            }

            _ = heartbeat.tick() => {
                if last_seen.elapsed() >= idle_timeout {
                    tracing::info!(%peer, "peer idle past timeout, closing");
                    break;
                }
                framed.send(Message::Heartbeat).await?;
            }
        }
    }

    // The guard inside `conn` drops here → room seat and registry
    // entry are released.
    Ok(())
}

/// Resolves to the next queued outbound message once logged in. Before
/// login there is no queue, so this pends forever and the select loop
/// never takes the branch.
async fn queued(conn: &mut Option<Established>) -> Option<Message> {
    match conn {
        Some(established) => established.outbound.recv().await,
        None => std::future::pending().await,
    }
}

/// Dispatches one inbound frame.
async fn handle_message(
    state: &Arc<ServerState>,
    framed: &mut Framed<TcpStream, FrameCodec>,
    conn: &mut Option<Established>,
    peer: SocketAddr,
    message: Message,
) -> Result<(), DuelforgeError> {
    match message {
        Message::LoginRequest { username, .. } => {
            let response = login(state, conn, peer, username);
            framed.send(response).await?;
        }

        // Any inbound frame already refreshed the idle clock; a
        // heartbeat carries no other payload.
        Message::Heartbeat => {}

        Message::RoomRequest { action, room_id } => {
            let response = match conn.as_mut() {
                Some(established) => room_request(state, established, action, room_id),
                None => Message::RoomResponse {
                    success: false,
                    room_id: None,
                    error: Some("login required".to_string()),
                },
            };
            framed.send(response).await?;
        }

        Message::RoomListRequest => {
            // Read-only, so browsing the lobby needs no login.
            let rooms = state.rooms.list_rooms();
            framed.send(Message::RoomListResponse { rooms }).await?;
        }

        Message::GameAction { action } => {
            let Some(established) = conn.as_mut() else {
                tracing::debug!(%peer, "game action before login, dropping");
                return Ok(());
            };
            let player_id = established.session.player_id;
            let Some(room_id) = established.guard.room else {
                tracing::debug!(%player_id, "game action outside a room, dropping");
                return Ok(());
            };
            // Rule rejections have no response message; the action
            // simply does not happen.
            if let Err(e) = state.rooms.handle_action(room_id, player_id, action) {
                tracing::debug!(%player_id, %room_id, error = %e, "game action rejected");
            }
        }

        _ => {
            // Server-to-client kinds arriving from a client are noise.
            tracing::debug!(%peer, "ignoring unexpected message");
        }
    }

    Ok(())
}

/// Handles a login attempt. Any credentials are accepted; identity is
/// the freshly minted id, not the username. A connection that is
/// already logged in is refused a second identity.
fn login(
    state: &Arc<ServerState>,
    conn: &mut Option<Established>,
    peer: SocketAddr,
    username: String,
) -> Message {
    if let Some(established) = conn {
        tracing::debug!(
            player_id = %established.session.player_id,
            "repeat login refused"
        );
        return Message::LoginResponse {
            success: false,
            player_id: None,
            error: Some("already logged in".to_string()),
        };
    }

    let player_id = state.sessions.allocate_id();
    let (tx, rx) = mpsc::unbounded_channel();
    let session = Arc::new(Session::new(player_id, username, tx));

    if let Err(e) = state.sessions.register(&session) {
        tracing::warn!(%player_id, error = %e, "session registration failed");
        return Message::LoginResponse {
            success: false,
            player_id: None,
            error: Some("could not register session".to_string()),
        };
    }

    tracing::info!(%player_id, %peer, username = %session.username, "player logged in");

    *conn = Some(Established {
        session,
        outbound: rx,
        guard: ConnectionGuard {
            player_id,
            room: None,
            state: Arc::clone(state),
        },
    });

    Message::LoginResponse {
        success: true,
        player_id: Some(player_id),
        error: None,
    }
}

/// Handles a room request, tracking the connection's seat in the
/// guard. One seat per connection: create and join require not being
/// seated, leave requires being seated.
fn room_request(
    state: &Arc<ServerState>,
    established: &mut Established,
    action: RoomAction,
    room_id: Option<RoomId>,
) -> Message {
    let player_id = established.session.player_id;

    let outcome: Result<Option<RoomId>, String> = match action {
        RoomAction::Create => {
            if let Some(current) = established.guard.room {
                Err(format!("already in room {current}"))
            } else {
                match state.rooms.create_room(&[player_id]) {
                    Ok(new_room) => {
                        established.guard.room = Some(new_room);
                        Ok(Some(new_room))
                    }
                    Err(e) => Err(e.to_string()),
                }
            }
        }

        RoomAction::Join => {
            if let Some(current) = established.guard.room {
                Err(format!("already in room {current}"))
            } else if let Some(target) = room_id {
                match state.rooms.join_room(target, player_id) {
                    Ok(()) => {
                        established.guard.room = Some(target);
                        Ok(Some(target))
                    }
                    Err(e) => Err(e.to_string()),
                }
            } else {
                Err("join requires a room_id".to_string())
            }
        }

        RoomAction::Leave => match established.guard.room.take() {
            // If the manager disagrees about the seat, the local view
            // was stale either way; dropping it is the fix.
            Some(current) => match state.rooms.leave_room(current, player_id) {
                Ok(()) => Ok(Some(current)),
                Err(e) => Err(e.to_string()),
            },
            None => Err("not in a room".to_string()),
        },
    };

    match outcome {
        Ok(room_id) => Message::RoomResponse {
            success: true,
            room_id,
            error: None,
        },
        Err(error) => {
            tracing::debug!(%player_id, %error, "room request refused");
            Message::RoomResponse {
                success: false,
                room_id: None,
                error: Some(error),
            }
        }
    }
}
