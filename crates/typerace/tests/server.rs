//! Integration tests for the Typerace server, handler, and full connection flow.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use typerace::prelude::*;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address and a
/// coordinator handle for inspecting room state.
async fn start_server() -> (String, CoordinatorHandle) {
    start_with(TyperaceServerBuilder::new()).await
}

/// Like [`start_server`], from a preconfigured builder.
async fn start_with(builder: TyperaceServerBuilder) -> (String, CoordinatorHandle) {
    let server = builder
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let coordinator = server.coordinator();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, coordinator)
}

/// Connects and consumes the `connected` greeting, returning the id.
async fn connect(addr: &str) -> (ClientWs, PlayerId) {
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    match recv(&mut ws).await {
        ServerEvent::Connected { id } => (ws, id),
        other => panic!("expected connected, got {other:?}"),
    }
}

async fn send(ws: &mut ClientWs, event: &str, data: Value) {
    let frame = json!({ "event": event, "data": data }).to_string();
    ws.send(Message::text(frame)).await.expect("send");
}

async fn recv_value(ws: &mut ClientWs) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("ws error");
        if msg.is_text() || msg.is_binary() {
            return serde_json::from_slice(&msg.into_data()).expect("valid json");
        }
    }
}

async fn recv(ws: &mut ClientWs) -> ServerEvent {
    serde_json::from_value(recv_value(ws).await).expect("known server event")
}

async fn join(ws: &mut ClientWs, room: &str, username: &str) -> ServerEvent {
    send(ws, "join-room", json!({ "roomId": room, "username": username })).await;
    recv(ws).await
}

/// Polls until the room reaches the expected player count (or is gone
/// when `expected` is `None`).
async fn wait_for_players(coordinator: &CoordinatorHandle, room: &str, expected: Option<usize>) {
    let code = RoomCode::parse(room).unwrap();
    for _ in 0..100 {
        let info = coordinator.room_info(code.clone()).await.unwrap();
        if info.map(|i| i.player_count) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("room {room} never reached {expected:?} players");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_connected_greeting_is_a_text_frame() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");

    let msg = ws.next().await.unwrap().unwrap();
    assert!(msg.is_text());
    let value: Value = serde_json::from_slice(&msg.into_data()).unwrap();
    assert_eq!(value["event"], "connected");
    assert!(value["data"]["id"].as_u64().is_some());
}

#[tokio::test]
async fn test_join_returns_room_state() {
    let (addr, _) = start_server().await;
    let (mut ws, me) = connect(&addr).await;

    send(&mut ws, "join-room", json!({ "roomId": "abcxyz", "username": "alice" })).await;
    let value = recv_value(&mut ws).await;
    assert_eq!(value["event"], "room-state");
    let data = &value["data"];
    assert_eq!(data["roomId"], "ABCXYZ", "room ids are upper-cased");
    assert_eq!(data["gameState"], "waiting");
    assert_eq!(data["creator"], me.0);
    assert_eq!(data["players"][0]["username"], "alice");
    assert_eq!(data["timeLimit"], 60);
    assert_eq!(data["wordCount"], 30);
    assert_eq!(data["gameMode"], "time");
}

#[tokio::test]
async fn test_two_player_race() {
    let (addr, coordinator) = start_server().await;
    let (mut a, a_id) = connect(&addr).await;
    let (mut b, b_id) = connect(&addr).await;

    join(&mut a, "RACE01", "alice").await;
    let ServerEvent::RoomState(snapshot) = join(&mut b, "RACE01", "bob").await else {
        panic!("expected room-state");
    };
    assert_eq!(snapshot.creator, a_id);
    assert_eq!(snapshot.players.len(), 2);

    let ServerEvent::PlayerJoined { player, players, .. } = recv(&mut a).await else {
        panic!("expected player-joined");
    };
    assert_eq!(player.id, b_id);
    assert_eq!(players.len(), 2);

    send(&mut a, "start-game", json!({ "roomId": "RACE01", "words": "the quick fox" })).await;
    for ws in [&mut a, &mut b] {
        let ServerEvent::GameStarted { words, players, .. } = recv(ws).await else {
            panic!("expected game-started");
        };
        assert_eq!(words, "the quick fox");
        assert_eq!(players.len(), 2);
    }

    send(
        &mut b,
        "update-progress",
        json!({ "roomId": "RACE01", "progress": 50, "wpm": 70, "accuracy": 96, "finished": false }),
    )
    .await;
    for ws in [&mut a, &mut b] {
        let ServerEvent::ProgressUpdate { player_id, progress, .. } = recv(ws).await else {
            panic!("expected progress-update");
        };
        assert_eq!(player_id, b_id);
        assert_eq!(progress, 50.0);
    }

    send(&mut a, "time-up", json!({ "roomId": "RACE01" })).await;
    for ws in [&mut a, &mut b] {
        assert!(matches!(recv(ws).await, ServerEvent::GameFinished { .. }));
    }

    let info = coordinator
        .room_info(RoomCode::parse("RACE01").unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(info.game_state.to_string(), "finished");
}

#[tokio::test]
async fn test_non_creator_start_gets_error() {
    let (addr, _) = start_server().await;
    let (mut a, _) = connect(&addr).await;
    let (mut b, _) = connect(&addr).await;
    join(&mut a, "ROOM22", "alice").await;
    join(&mut b, "ROOM22", "bob").await;
    recv(&mut a).await; // player-joined

    send(&mut b, "start-game", json!({ "roomId": "ROOM22", "words": "nope" })).await;
    let ServerEvent::Error { message } = recv(&mut b).await else {
        panic!("expected error");
    };
    assert_eq!(message, "Only the room creator can start the game");

    // The creator still can.
    send(&mut a, "start-game", json!({ "roomId": "ROOM22", "words": "yes" })).await;
    assert!(matches!(recv(&mut a).await, ServerEvent::GameStarted { .. }));
}

#[tokio::test]
async fn test_malformed_events_get_error() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;

    send(&mut ws, "join-room", json!({ "username": "alice" })).await;
    let ServerEvent::Error { message } = recv(&mut ws).await else {
        panic!("expected error");
    };
    assert_eq!(message, "Room ID is required");

    ws.send(Message::text("not json")).await.unwrap();
    assert!(matches!(recv(&mut ws).await, ServerEvent::Error { .. }));

    send(&mut ws, "fly-away", json!({ "roomId": "ABCXYZ" })).await;
    assert!(matches!(recv(&mut ws).await, ServerEvent::Error { .. }));

    // The connection is still usable.
    assert!(matches!(
        join(&mut ws, "ABCXYZ", "alice").await,
        ServerEvent::RoomState(_)
    ));
}

#[tokio::test]
async fn test_leave_room_accepts_bare_room_id() {
    let (addr, coordinator) = start_server().await;
    let (mut a, _) = connect(&addr).await;
    let (mut b, b_id) = connect(&addr).await;
    join(&mut a, "BARE01", "alice").await;
    join(&mut b, "BARE01", "bob").await;
    recv(&mut a).await; // player-joined

    send(&mut b, "leave-room", json!("BARE01")).await;
    let ServerEvent::PlayerLeft { player_id, username, players } = recv(&mut a).await else {
        panic!("expected player-left");
    };
    assert_eq!(player_id, b_id);
    assert_eq!(username, "bob");
    assert_eq!(players.len(), 1);
    wait_for_players(&coordinator, "BARE01", Some(1)).await;
}

#[tokio::test]
async fn test_chat_is_truncated() {
    let (addr, _) = start_server().await;
    let (mut ws, _) = connect(&addr).await;
    join(&mut ws, "CHAT01", "alice").await;

    send(&mut ws, "chat-message", json!({ "roomId": "CHAT01", "message": "   " })).await;
    send(
        &mut ws,
        "chat-message",
        json!({ "roomId": "CHAT01", "message": "a".repeat(300), "username": "alice" }),
    )
    .await;

    // The blank message produced nothing, so the next event is the long one.
    let ServerEvent::NewChatMessage { username, message, .. } = recv(&mut ws).await else {
        panic!("expected new-chat-message");
    };
    assert_eq!(username, "alice");
    assert_eq!(message.chars().count(), 200);
}

#[tokio::test]
async fn test_disconnect_removes_player_and_empty_room() {
    let (addr, coordinator) = start_server().await;
    let (mut a, _) = connect(&addr).await;
    let (mut b, b_id) = connect(&addr).await;
    join(&mut a, "GONE01", "alice").await;
    join(&mut b, "GONE01", "bob").await;
    recv(&mut a).await; // player-joined

    b.close(None).await.unwrap();
    drop(b);
    let ServerEvent::PlayerLeft { player_id, players, .. } = recv(&mut a).await else {
        panic!("expected player-left");
    };
    assert_eq!(player_id, b_id);
    assert_eq!(players.len(), 1);

    a.close(None).await.unwrap();
    drop(a);
    wait_for_players(&coordinator, "GONE01", None).await;
    assert_eq!(coordinator.room_count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_silent_member_stays_in_room() {
    let (addr, coordinator) =
        start_with(TyperaceServerBuilder::new().keepalive_interval(Duration::from_millis(50))).await;
    let (mut a, _) = connect(&addr).await;
    let (mut b, _) = connect(&addr).await;
    join(&mut a, "QUIET1", "alice").await;
    join(&mut b, "QUIET1", "bob").await;

    // Alice sends nothing across many keepalive intervals while bob chats.
    for i in 0..6 {
        send(&mut b, "chat-message", json!({ "roomId": "QUIET1", "message": format!("hi {i}") }))
            .await;
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    wait_for_players(&coordinator, "QUIET1", Some(2)).await;

    // She is still the creator and can start the race.
    send(&mut a, "start-game", json!({ "roomId": "QUIET1", "words": "still here" })).await;
    for _ in 0..10 {
        match recv(&mut a).await {
            ServerEvent::GameStarted { players, .. } => {
                assert_eq!(players.len(), 2);
                return;
            }
            ServerEvent::PlayerJoined { .. } | ServerEvent::NewChatMessage { .. } => continue,
            other => panic!("unexpected event {other:?}"),
        }
    }
    panic!("game-started never arrived");
}

#[tokio::test]
async fn test_stalled_handshake_does_not_block_other_clients() {
    let (addr, _) = start_server().await;

    // Opens TCP and never sends the upgrade request.
    let _stalled = tokio::net::TcpStream::connect(&addr).await.unwrap();

    let (mut ws, _) = tokio::time::timeout(Duration::from_secs(2), connect(&addr))
        .await
        .expect("a stalled peer must not hold up the accept loop");
    assert!(matches!(
        join(&mut ws, "OPEN01", "alice").await,
        ServerEvent::RoomState(_)
    ));
}

#[tokio::test]
async fn test_stalled_handshake_is_dropped_after_timeout() {
    use tokio::io::AsyncReadExt;

    let (addr, _) =
        start_with(TyperaceServerBuilder::new().handshake_timeout(Duration::from_millis(100))).await;
    let mut stalled = tokio::net::TcpStream::connect(&addr).await.unwrap();

    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), stalled.read(&mut buf))
        .await
        .expect("server should hang up on the stalled peer");
    assert_eq!(read.unwrap_or(0), 0, "expected EOF, not data");
}
