//! Integration tests for the Cardroom server: full WebSocket flows
//! against a real server on an ephemeral port.

use std::time::Duration;

use cardroom::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

struct TestServer {
    ws_addr: String,
    registry: RegistryHandle,
}

/// Starts a server on ephemeral ports and returns its WebSocket address
/// plus a registry handle for room setup.
async fn start_server() -> TestServer {
    let server = CardroomServerBuilder::new()
        .ws_bind("127.0.0.1:0")
        .http_bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let ws_addr = server
        .ws_addr()
        .expect("should have local addr")
        .to_string();
    let registry = server.registry();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;

    TestServer { ws_addr, registry }
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

fn encode_frame(roomid: &str, event: ClientEvent) -> Message {
    let frame = ClientFrame {
        roomid: RoomId::new(roomid),
        event,
    };
    Message::Text(serde_json::to_string(&frame).expect("encode").into())
}

async fn send(ws: &mut ClientWs, roomid: &str, event: ClientEvent) {
    ws.send(encode_frame(roomid, event)).await.expect("send");
}

async fn recv_event(ws: &mut ClientWs) -> ServerEvent {
    let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for server event")
        .expect("stream ended")
        .expect("recv failed");
    serde_json::from_slice(&msg.into_data()).expect("decode server event")
}

/// Asserts that no event arrives within a short window.
async fn expect_silence(ws: &mut ClientWs) {
    let result =
        tokio::time::timeout(Duration::from_millis(300), ws.next()).await;
    assert!(result.is_err(), "expected silence, got {result:?}");
}

async fn attach(
    ws: &mut ClientWs,
    roomid: &str,
    player_id: Option<&str>,
) -> ServerEvent {
    send(
        ws,
        roomid,
        ClientEvent::NewConnection {
            player_id: player_id.map(PlayerId::new),
        },
    )
    .await;
    recv_event(ws).await
}

/// Two seated players, game started, all pending events drained.
async fn setup_game(server: &TestServer) -> (ClientWs, ClientWs) {
    server
        .registry
        .create(RoomId::new("R1"))
        .await
        .expect("create room");

    let mut ws1 = connect(&server.ws_addr).await;
    let mut ws2 = connect(&server.ws_addr).await;

    attach(&mut ws1, "R1", Some("p1")).await;
    attach(&mut ws2, "R1", Some("p2")).await;

    send(
        &mut ws1,
        "R1",
        ClientEvent::AddPlayer {
            new_player: (PlayerId::new("p1"), "Alice".into()),
        },
    )
    .await;
    let _ = recv_event(&mut ws1).await; // PLAYER_ADDED p1
    let _ = recv_event(&mut ws2).await;

    send(
        &mut ws2,
        "R1",
        ClientEvent::AddPlayer {
            new_player: (PlayerId::new("p2"), "Bob".into()),
        },
    )
    .await;
    let _ = recv_event(&mut ws1).await; // PLAYER_ADDED p2
    let _ = recv_event(&mut ws2).await;

    send(&mut ws1, "R1", ClientEvent::StartGame).await;
    let _ = recv_event(&mut ws1).await; // GAME_STARTED
    let _ = recv_event(&mut ws2).await;

    (ws1, ws2)
}

// =========================================================================
// Lobby flow
// =========================================================================

#[tokio::test]
async fn test_lobby_connection_gets_empty_roster_and_fresh_id() {
    let server = start_server().await;
    server.registry.create(RoomId::new("R1")).await.unwrap();
    let mut ws = connect(&server.ws_addr).await;

    let reply = attach(&mut ws, "R1", None).await;

    match reply {
        ServerEvent::ConnectedLobby { players, player_id } => {
            assert!(players.is_empty());
            assert_eq!(player_id.as_str().len(), 32);
        }
        other => panic!("expected ConnectedLobby, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lobby_connection_confirms_presented_id() {
    let server = start_server().await;
    server.registry.create(RoomId::new("R1")).await.unwrap();
    let mut ws = connect(&server.ws_addr).await;

    let reply = attach(&mut ws, "R1", Some("my-token")).await;

    match reply {
        ServerEvent::ConnectedLobby { player_id, .. } => {
            assert_eq!(player_id, PlayerId::new("my-token"));
        }
        other => panic!("expected ConnectedLobby, got {other:?}"),
    }
}

#[tokio::test]
async fn test_add_player_broadcast_reaches_both_connections_in_order() {
    let server = start_server().await;
    server.registry.create(RoomId::new("R1")).await.unwrap();

    let mut ws1 = connect(&server.ws_addr).await;
    let mut ws2 = connect(&server.ws_addr).await;
    attach(&mut ws1, "R1", Some("p1")).await;
    attach(&mut ws2, "R1", Some("p2")).await;

    send(
        &mut ws1,
        "R1",
        ClientEvent::AddPlayer {
            new_player: (PlayerId::new("p1"), "Alice".into()),
        },
    )
    .await;
    send(
        &mut ws2,
        "R1",
        ClientEvent::AddPlayer {
            new_player: (PlayerId::new("p2"), "Bob".into()),
        },
    )
    .await;

    for ws in [&mut ws1, &mut ws2] {
        let first = recv_event(ws).await;
        let second = recv_event(ws).await;
        assert_eq!(
            first,
            ServerEvent::PlayerAdded {
                new_player: (PlayerId::new("p1"), "Alice".into()),
            }
        );
        assert_eq!(
            second,
            ServerEvent::PlayerAdded {
                new_player: (PlayerId::new("p2"), "Bob".into()),
            }
        );
    }
}

#[tokio::test]
async fn test_second_connection_sees_current_roster() {
    let server = start_server().await;
    server.registry.create(RoomId::new("R1")).await.unwrap();

    let mut ws1 = connect(&server.ws_addr).await;
    attach(&mut ws1, "R1", Some("p1")).await;
    send(
        &mut ws1,
        "R1",
        ClientEvent::AddPlayer {
            new_player: (PlayerId::new("p1"), "Alice".into()),
        },
    )
    .await;
    let _ = recv_event(&mut ws1).await;

    let mut ws2 = connect(&server.ws_addr).await;
    let reply = attach(&mut ws2, "R1", None).await;

    match reply {
        ServerEvent::ConnectedLobby { players, .. } => {
            assert_eq!(
                players,
                vec![(PlayerId::new("p1"), "Alice".to_string())]
            );
        }
        other => panic!("expected ConnectedLobby, got {other:?}"),
    }
}

// =========================================================================
// Router edge cases
// =========================================================================

#[tokio::test]
async fn test_unknown_room_event_dropped_connection_stays_usable() {
    let server = start_server().await;
    let mut ws = connect(&server.ws_addr).await;

    // Routed to a room that doesn't exist: dropped, no reply, no close.
    send(
        &mut ws,
        "ghost",
        ClientEvent::NewConnection { player_id: None },
    )
    .await;
    expect_silence(&mut ws).await;

    // The same socket works once the room exists.
    server.registry.create(RoomId::new("R1")).await.unwrap();
    let reply = attach(&mut ws, "R1", None).await;
    assert!(matches!(reply, ServerEvent::ConnectedLobby { .. }));
}

#[tokio::test]
async fn test_malformed_frame_ignored_connection_stays_usable() {
    let server = start_server().await;
    server.registry.create(RoomId::new("R1")).await.unwrap();
    let mut ws = connect(&server.ws_addr).await;

    ws.send(Message::Text("not json at all".to_string().into()))
        .await
        .expect("send");
    ws.send(Message::Text(r#"{"roomid":"R1"}"#.to_string().into()))
        .await
        .expect("send"); // valid JSON, missing type

    let reply = attach(&mut ws, "R1", None).await;
    assert!(matches!(reply, ServerEvent::ConnectedLobby { .. }));
}

// =========================================================================
// Game flow
// =========================================================================

#[tokio::test]
async fn test_start_game_not_rebroadcast_once_playing() {
    let server = start_server().await;
    let (mut ws1, mut ws2) = setup_game(&server).await;

    send(&mut ws1, "R1", ClientEvent::StartGame).await;

    expect_silence(&mut ws1).await;
    expect_silence(&mut ws2).await;
}

#[tokio::test]
async fn test_dropped_player_can_reconnect_with_their_token() {
    let server = start_server().await;
    let (_ws1, mut ws2) = setup_game(&server).await;

    ws2.close(None).await.expect("close");
    drop(ws2);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut ws3 = connect(&server.ws_addr).await;
    let reply = attach(&mut ws3, "R1", Some("p2")).await;
    assert_eq!(reply, ServerEvent::ConnectedPlayerSync);
}

#[tokio::test]
async fn test_stranger_joining_running_game_is_spectator() {
    let server = start_server().await;
    let (_ws1, _ws2) = setup_game(&server).await;

    let mut ws3 = connect(&server.ws_addr).await;
    let reply = attach(&mut ws3, "R1", Some("outsider")).await;
    assert_eq!(reply, ServerEvent::ConnectedSpecSync);
}

#[tokio::test]
async fn test_reconnect_consumes_the_pending_slot_once() {
    let server = start_server().await;
    let (_ws1, mut ws2) = setup_game(&server).await;

    ws2.close(None).await.expect("close");
    drop(ws2);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // First presentation of p2 reclaims the seat...
    let mut ws3 = connect(&server.ws_addr).await;
    let reply = attach(&mut ws3, "R1", Some("p2")).await;
    assert_eq!(reply, ServerEvent::ConnectedPlayerSync);

    // ...a second presentation of the same token is just a spectator.
    let mut ws4 = connect(&server.ws_addr).await;
    let reply = attach(&mut ws4, "R1", Some("p2")).await;
    assert_eq!(reply, ServerEvent::ConnectedSpecSync);
}

#[tokio::test]
async fn test_resume_game_then_returning_player_is_spectator() {
    let server = start_server().await;
    let (mut ws1, mut ws2) = setup_game(&server).await;

    ws2.close(None).await.expect("close");
    drop(ws2);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The remaining player chooses to keep playing.
    send(&mut ws1, "R1", ClientEvent::ResumeGame).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // The abandoned seat is gone; its token now joins as a spectator.
    let mut ws3 = connect(&server.ws_addr).await;
    let reply = attach(&mut ws3, "R1", Some("p2")).await;
    assert_eq!(reply, ServerEvent::ConnectedSpecSync);
}

#[tokio::test]
async fn test_played_card_is_routed_but_produces_no_core_reply() {
    let server = start_server().await;
    let (mut ws1, mut ws2) = setup_game(&server).await;

    send(&mut ws1, "R1", ClientEvent::PlayedCard).await;

    expect_silence(&mut ws1).await;
    expect_silence(&mut ws2).await;
}

#[tokio::test]
async fn test_rooms_are_independent() {
    let server = start_server().await;
    server.registry.create(RoomId::new("R1")).await.unwrap();
    server.registry.create(RoomId::new("R2")).await.unwrap();

    let mut ws1 = connect(&server.ws_addr).await;
    let mut ws2 = connect(&server.ws_addr).await;
    attach(&mut ws1, "R1", Some("p1")).await;
    attach(&mut ws2, "R2", Some("p2")).await;

    // Traffic in R1 must not reach the connection attached to R2.
    send(
        &mut ws1,
        "R1",
        ClientEvent::AddPlayer {
            new_player: (PlayerId::new("p1"), "Alice".into()),
        },
    )
    .await;

    let reply = recv_event(&mut ws1).await;
    assert!(matches!(reply, ServerEvent::PlayerAdded { .. }));
    expect_silence(&mut ws2).await;
}
