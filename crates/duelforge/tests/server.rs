//! Integration tests for the Duelforge server: login, rooms, duels,
//! heartbeats, and connection teardown over real TCP sockets.

use std::net::SocketAddr;
use std::time::Duration;

use duelforge::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

// =========================================================================
// Helpers
// =========================================================================

type Client = Framed<TcpStream, FrameCodec>;

/// Starts a server built from `builder` on a random port.
async fn spawn_server(builder: DuelforgeServerBuilder) -> SocketAddr {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");
    let addr = server.local_addr().expect("should have local addr");
    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

/// Starts a default-config server: rooms of two, classic rules.
async fn start_server() -> SocketAddr {
    spawn_server(DuelforgeServer::builder()).await
}

/// Rules where every card is an attack, so any drawn hand can hit.
fn all_attack_rules() -> GameRules {
    GameRules {
        attack_cards: 45,
        defend_cards: 0,
        heal_cards: 0,
        ..GameRules::default()
    }
}

/// All-attack rules at one hp: the first hit always ends the duel.
fn sudden_death_rules() -> GameRules {
    GameRules {
        max_hp: 1,
        ..all_attack_rules()
    }
}

async fn connect(addr: SocketAddr) -> Client {
    let stream = TcpStream::connect(addr).await.expect("should connect");
    Framed::new(stream, FrameCodec::new())
}

/// Receives one frame, failing the test on close or timeout.
async fn recv(client: &mut Client) -> Message {
    tokio::time::timeout(Duration::from_secs(2), client.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("connection closed unexpectedly")
        .expect("frame should decode")
}

/// Like [`recv`], but skips server heartbeats. For tests that run with
/// a short heartbeat interval.
async fn recv_data(client: &mut Client) -> Message {
    loop {
        let message = recv(client).await;
        if !matches!(message, Message::Heartbeat) {
            return message;
        }
    }
}

/// Logs in and returns the minted player id.
async fn login(client: &mut Client, username: &str) -> PlayerId {
    client
        .send(Message::LoginRequest {
            username: username.to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .expect("send login");
    match recv(client).await {
        Message::LoginResponse {
            success: true,
            player_id: Some(player_id),
            ..
        } => player_id,
        other => panic!("expected successful login, got {other:?}"),
    }
}

/// Creates a room and returns its id.
async fn create_room(client: &mut Client) -> RoomId {
    client
        .send(Message::RoomRequest {
            action: RoomAction::Create,
            room_id: None,
        })
        .await
        .expect("send create");
    match recv(client).await {
        Message::RoomResponse {
            success: true,
            room_id: Some(room_id),
            ..
        } => room_id,
        other => panic!("expected room created, got {other:?}"),
    }
}

async fn send_join(client: &mut Client, room_id: RoomId) {
    client
        .send(Message::RoomRequest {
            action: RoomAction::Join,
            room_id: Some(room_id),
        })
        .await
        .expect("send join");
}

/// Consumes the opening sequence of a started duel: `GameStart`, the
/// first draw push, and the first play push.
async fn drain_opening(client: &mut Client) {
    assert!(matches!(recv(client).await, Message::GameStart { .. }));
    assert!(matches!(
        recv(client).await,
        Message::GameState {
            phase: TurnPhase::Draw,
            ..
        }
    ));
    assert!(matches!(
        recv(client).await,
        Message::GameState {
            phase: TurnPhase::Play,
            ..
        }
    ));
}

/// Logs two players in, seats them in one room, and consumes the
/// opening frames on both sides. The first id returned has the first
/// turn.
async fn start_duel(addr: SocketAddr) -> (Client, PlayerId, Client, PlayerId) {
    let mut a = connect(addr).await;
    let a_id = login(&mut a, "ada").await;
    let mut b = connect(addr).await;
    let b_id = login(&mut b, "brian").await;

    let room_id = create_room(&mut a).await;
    send_join(&mut b, room_id).await;
    match recv(&mut b).await {
        Message::RoomResponse { success: true, .. } => {}
        other => panic!("expected join to succeed, got {other:?}"),
    }

    drain_opening(&mut a).await;
    drain_opening(&mut b).await;
    (a, a_id, b, b_id)
}

fn hp_of(state: &GameSnapshot, player_id: PlayerId) -> u32 {
    state
        .players
        .iter()
        .find(|p| p.player_id == player_id)
        .map(|p| p.hp)
        .expect("player should be in the snapshot")
}

// =========================================================================
// Login
// =========================================================================

#[tokio::test]
async fn test_login_mints_monotonic_ids() {
    let addr = start_server().await;

    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    assert_eq!(login(&mut first, "ada").await, PlayerId(1000));
    assert_eq!(login(&mut second, "brian").await, PlayerId(1001));
}

#[tokio::test]
async fn test_second_login_on_same_connection_rejected() {
    let addr = start_server().await;
    let mut client = connect(addr).await;
    login(&mut client, "ada").await;

    client
        .send(Message::LoginRequest {
            username: "ada-again".to_string(),
            password: "hunter2".to_string(),
        })
        .await
        .expect("send");
    match recv(&mut client).await {
        Message::LoginResponse {
            success: false,
            player_id: None,
            error: Some(error),
        } => assert!(error.contains("already")),
        other => panic!("expected rejected login, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_request_before_login_rejected() {
    let addr = start_server().await;
    let mut client = connect(addr).await;

    client
        .send(Message::RoomRequest {
            action: RoomAction::Create,
            room_id: None,
        })
        .await
        .expect("send");
    match recv(&mut client).await {
        Message::RoomResponse {
            success: false,
            error: Some(error),
            ..
        } => assert!(error.contains("login")),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_list_before_login_is_served() {
    let addr = start_server().await;
    let mut host = connect(addr).await;
    login(&mut host, "ada").await;
    let room_id = create_room(&mut host).await;

    // Browsing the lobby is read-only and needs no identity.
    let mut guest = connect(addr).await;
    guest.send(Message::RoomListRequest).await.expect("send list");
    match recv(&mut guest).await {
        Message::RoomListResponse { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].room_id, room_id);
        }
        other => panic!("expected room list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_game_action_before_login_is_dropped() {
    let addr = start_server().await;
    let mut client = connect(addr).await;

    client
        .send(Message::GameAction {
            action: PlayerAction::EndTurn,
        })
        .await
        .expect("send");

    // The action is dropped without closing the connection; a login
    // afterwards still works.
    let player_id = login(&mut client, "ada").await;
    assert_eq!(player_id, PlayerId(1000));
}

// =========================================================================
// Rooms
// =========================================================================

#[tokio::test]
async fn test_create_room_waits_for_opponent() {
    let addr = start_server().await;
    let mut client = connect(addr).await;
    login(&mut client, "ada").await;

    let room_id = create_room(&mut client).await;
    assert_eq!(room_id, RoomId(1000));

    client
        .send(Message::RoomListRequest)
        .await
        .expect("send list");
    match recv(&mut client).await {
        Message::RoomListResponse { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].room_id, room_id);
            assert_eq!(rooms[0].player_count, 1);
            assert_eq!(rooms[0].capacity, 2);
            assert_eq!(rooms[0].phase, RoomPhase::Waiting);
        }
        other => panic!("expected room list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_starts_duel_with_opening_frames() {
    let addr = start_server().await;

    let mut a = connect(addr).await;
    let a_id = login(&mut a, "ada").await;
    let mut b = connect(addr).await;
    let b_id = login(&mut b, "brian").await;

    let room_id = create_room(&mut a).await;
    send_join(&mut b, room_id).await;

    // The joiner sees its response first, then the room-wide opening.
    match recv(&mut b).await {
        Message::RoomResponse {
            success: true,
            room_id: Some(joined),
            ..
        } => assert_eq!(joined, room_id),
        other => panic!("expected join response, got {other:?}"),
    }

    for client in [&mut a, &mut b] {
        match recv(client).await {
            Message::GameStart {
                room_id: started,
                players,
            } => {
                assert_eq!(started, room_id);
                // Seating order is join order and doubles as turn order.
                assert_eq!(players, vec![a_id, b_id]);
            }
            other => panic!("expected game start, got {other:?}"),
        }

        match recv(client).await {
            Message::GameState {
                phase: TurnPhase::Draw,
                state,
                log,
            } => {
                assert_eq!(log, format!("{a_id} draws 2 cards"));
                assert_eq!(state.current, a_id);
                // Opening hand of 4, plus the first turn's draw of 2.
                assert_eq!(state.players[0].hand.len(), 6);
                assert_eq!(state.players[1].hand.len(), 4);
                assert_eq!(hp_of(&state, a_id), 4);
                assert_eq!(hp_of(&state, b_id), 4);
            }
            other => panic!("expected draw push, got {other:?}"),
        }

        match recv(client).await {
            Message::GameState {
                phase: TurnPhase::Play,
                log,
                ..
            } => assert_eq!(log, format!("It's {a_id}'s turn")),
            other => panic!("expected play push, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_join_unknown_room_fails() {
    let addr = start_server().await;
    let mut client = connect(addr).await;
    login(&mut client, "ada").await;

    send_join(&mut client, RoomId(9999)).await;
    match recv(&mut client).await {
        Message::RoomResponse {
            success: false,
            error: Some(error),
            ..
        } => assert!(error.contains("not found")),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_join_running_room_fails() {
    let addr = start_server().await;
    let (_a, _, _b, _) = start_duel(addr).await;

    let mut late = connect(addr).await;
    login(&mut late, "late").await;
    send_join(&mut late, RoomId(1000)).await;
    match recv(&mut late).await {
        Message::RoomResponse {
            success: false,
            error: Some(error),
            ..
        } => assert!(error.contains("playing")),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_leave_room_then_leave_again() {
    let addr = start_server().await;
    let mut client = connect(addr).await;
    login(&mut client, "ada").await;
    let room_id = create_room(&mut client).await;

    client
        .send(Message::RoomRequest {
            action: RoomAction::Leave,
            room_id: None,
        })
        .await
        .expect("send leave");
    match recv(&mut client).await {
        Message::RoomResponse {
            success: true,
            room_id: Some(left),
            ..
        } => assert_eq!(left, room_id),
        other => panic!("expected leave to succeed, got {other:?}"),
    }

    client
        .send(Message::RoomRequest {
            action: RoomAction::Leave,
            room_id: None,
        })
        .await
        .expect("send leave");
    match recv(&mut client).await {
        Message::RoomResponse {
            success: false,
            error: Some(error),
            ..
        } => assert!(error.contains("not in a room")),
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_list_is_ascending() {
    let addr = start_server().await;

    let mut first = connect(addr).await;
    login(&mut first, "ada").await;
    let mut second = connect(addr).await;
    login(&mut second, "brian").await;

    assert_eq!(create_room(&mut first).await, RoomId(1000));
    assert_eq!(create_room(&mut second).await, RoomId(1001));

    let mut observer = connect(addr).await;
    login(&mut observer, "eve").await;
    observer
        .send(Message::RoomListRequest)
        .await
        .expect("send list");
    match recv(&mut observer).await {
        Message::RoomListResponse { rooms } => {
            let ids: Vec<RoomId> = rooms.iter().map(|r| r.room_id).collect();
            assert_eq!(ids, vec![RoomId(1000), RoomId(1001)]);
        }
        other => panic!("expected room list, got {other:?}"),
    }
}

// =========================================================================
// Duels
// =========================================================================

#[tokio::test]
async fn test_end_turn_passes_play() {
    let addr = start_server().await;
    let (mut a, a_id, mut b, b_id) = start_duel(addr).await;

    a.send(Message::GameAction {
        action: PlayerAction::EndTurn,
    })
    .await
    .expect("send end turn");

    for client in [&mut a, &mut b] {
        // The turn-ended announcement lands before the hand-off.
        match recv(client).await {
            Message::GameState {
                phase: TurnPhase::Play,
                state,
                log,
            } => {
                assert_eq!(log, format!("{a_id} ends their turn"));
                assert_eq!(state.current, a_id);
            }
            other => panic!("expected turn-ended push, got {other:?}"),
        }
        match recv(client).await {
            Message::GameState {
                phase: TurnPhase::Draw,
                state,
                log,
            } => {
                assert_eq!(log, format!("{b_id} draws 2 cards"));
                assert_eq!(state.current, b_id);
            }
            other => panic!("expected draw push, got {other:?}"),
        }
        match recv(client).await {
            Message::GameState {
                phase: TurnPhase::Play,
                log,
                ..
            } => assert_eq!(log, format!("It's {b_id}'s turn")),
            other => panic!("expected play push, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_action_out_of_turn_is_dropped() {
    let addr = start_server().await;
    let (_a, _, mut b, _) = start_duel(addr).await;

    // B does not have the turn; the action vanishes without a reply.
    b.send(Message::GameAction {
        action: PlayerAction::EndTurn,
    })
    .await
    .expect("send end turn");

    // The next request on the same connection is answered as usual,
    // proving nothing was queued in between and nothing closed.
    b.send(Message::RoomListRequest).await.expect("send list");
    match recv(&mut b).await {
        Message::RoomListResponse { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].phase, RoomPhase::Playing);
        }
        other => panic!("expected room list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attack_whispers_prompt_to_target_only() {
    let addr = spawn_server(DuelforgeServer::builder().rules(all_attack_rules())).await;
    let (mut a, a_id, mut b, b_id) = start_duel(addr).await;

    a.send(Message::GameAction {
        action: PlayerAction::PlayCard {
            card: CardKind::Attack,
            target: Some(b_id),
        },
    })
    .await
    .expect("send attack");

    // The target hears the defend prompt first, then the outcome.
    match recv(&mut b).await {
        Message::GameState { log, .. } => {
            assert_eq!(log, format!("{a_id} attacks you, a defend card will block it"));
        }
        other => panic!("expected defend prompt, got {other:?}"),
    }
    match recv(&mut b).await {
        Message::GameState { log, state, .. } => {
            assert!(log.contains("hits"));
            assert_eq!(hp_of(&state, b_id), 3);
        }
        other => panic!("expected attack outcome, got {other:?}"),
    }

    // The attacker sees only the outcome.
    match recv(&mut a).await {
        Message::GameState { log, state, .. } => {
            assert_eq!(log, format!("{a_id} hits {b_id} for 1 damage, 3 hp left"));
            assert_eq!(hp_of(&state, b_id), 3);
        }
        other => panic!("expected attack outcome, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fatal_attack_ends_game() {
    let addr = spawn_server(DuelforgeServer::builder().rules(sudden_death_rules())).await;
    let (mut a, a_id, mut b, b_id) = start_duel(addr).await;

    a.send(Message::GameAction {
        action: PlayerAction::PlayCard {
            card: CardKind::Attack,
            target: Some(b_id),
        },
    })
    .await
    .expect("send attack");

    // Attacker: outcome, then game over.
    match recv(&mut a).await {
        Message::GameState { log, .. } => assert!(log.contains("wins the duel")),
        other => panic!("expected final outcome, got {other:?}"),
    }
    match recv(&mut a).await {
        Message::GameOver { winner } => assert_eq!(winner, a_id),
        other => panic!("expected game over, got {other:?}"),
    }

    // Target: defend prompt, outcome, game over.
    match recv(&mut b).await {
        Message::GameState { log, .. } => assert!(log.contains("attacks you")),
        other => panic!("expected defend prompt, got {other:?}"),
    }
    match recv(&mut b).await {
        Message::GameState { log, .. } => assert!(log.contains("falls")),
        other => panic!("expected final outcome, got {other:?}"),
    }
    match recv(&mut b).await {
        Message::GameOver { winner } => assert_eq!(winner, a_id),
        other => panic!("expected game over, got {other:?}"),
    }
}

// =========================================================================
// Heartbeats and teardown
// =========================================================================

fn snappy_session() -> SessionConfig {
    SessionConfig {
        heartbeat_interval: Duration::from_millis(50),
        idle_timeout: Duration::from_millis(150),
    }
}

#[tokio::test]
async fn test_heartbeat_keeps_idle_connection_alive() {
    let addr = spawn_server(DuelforgeServer::builder().session_config(snappy_session())).await;
    let mut client = connect(addr).await;
    login(&mut client, "ada").await;

    // Stay otherwise silent for well past the idle timeout.
    for _ in 0..6 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.send(Message::Heartbeat).await.expect("send heartbeat");
    }

    client.send(Message::RoomListRequest).await.expect("send list");
    match recv_data(&mut client).await {
        Message::RoomListResponse { rooms } => assert!(rooms.is_empty()),
        other => panic!("expected room list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_silent_connection_times_out() {
    let addr = spawn_server(DuelforgeServer::builder().session_config(snappy_session())).await;
    let mut client = connect(addr).await;
    login(&mut client, "ada").await;

    // No more frames from us. The server keeps beating, then closes.
    let mut saw_heartbeat = false;
    loop {
        match tokio::time::timeout(Duration::from_secs(2), client.next()).await {
            Ok(Some(Ok(Message::Heartbeat))) => saw_heartbeat = true,
            Ok(Some(Ok(other))) => panic!("unexpected frame: {other:?}"),
            Ok(Some(Err(_))) | Ok(None) => break,
            Err(_) => panic!("server never closed the idle connection"),
        }
    }
    assert!(saw_heartbeat, "expected at least one server heartbeat");
}

#[tokio::test]
async fn test_malformed_frame_closes_connection() {
    let addr = start_server().await;
    let mut raw = TcpStream::connect(addr).await.expect("should connect");

    // Valid header, body that is not JSON.
    raw.write_all(&[0, 0, 0, 5]).await.expect("write header");
    raw.write_all(b"notjs").await.expect("write body");

    let mut buf = [0u8; 8];
    let read = tokio::time::timeout(Duration::from_secs(2), raw.read(&mut buf))
        .await
        .expect("server should close the connection")
        .unwrap_or(0);
    assert_eq!(read, 0, "expected EOF after a malformed frame");
}

#[tokio::test]
async fn test_oversize_frame_closes_connection() {
    let addr = start_server().await;
    let mut raw = TcpStream::connect(addr).await.expect("should connect");

    // Header announcing a 10 MiB body; the limit is 64 KiB.
    raw.write_all(&[0x00, 0xA0, 0x00, 0x00]).await.expect("write header");

    let mut buf = [0u8; 8];
    let read = tokio::time::timeout(Duration::from_secs(2), raw.read(&mut buf))
        .await
        .expect("server should close the connection")
        .unwrap_or(0);
    assert_eq!(read, 0, "expected EOF after an oversize header");
}

#[tokio::test]
async fn test_disconnect_frees_room_seat() {
    let addr = start_server().await;

    let mut a = connect(addr).await;
    login(&mut a, "ada").await;
    let room_id = create_room(&mut a).await;
    drop(a);

    // Give the server a moment to run the teardown.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let mut b = connect(addr).await;
    login(&mut b, "brian").await;
    b.send(Message::RoomListRequest).await.expect("send list");
    match recv(&mut b).await {
        Message::RoomListResponse { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].room_id, room_id);
            // The seat was released; the empty room waits for the sweeper.
            assert_eq!(rooms[0].player_count, 0);
        }
        other => panic!("expected room list, got {other:?}"),
    }
}
