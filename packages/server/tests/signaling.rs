//! End-to-end tests: a real server on an ephemeral port, driven over WebSocket and HTTP.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};
use yoriai_server::{
    config::ServerConfig,
    domain::MAX_FRAME_BYTES,
    infrastructure::{message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository},
    ui::{AppState, Server},
};
use yoriai_shared::time::{Clock, SystemClock};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Start a server on 127.0.0.1 with an ephemeral port and return its address.
async fn start_server(config: ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let repository = Arc::new(InMemoryRoomRepository::new(clock.clone()));
    let message_pusher = Arc::new(WebSocketMessagePusher::default());
    let server = Server::new(AppState::new(config, repository, message_pusher, clock));

    tokio::spawn(async move {
        server
            .serve(listener, std::future::pending())
            .await
            .unwrap();
    });
    addr
}

/// Connect and wait for the initial room list, so ids follow connection order.
async fn connect(addr: SocketAddr) -> Client {
    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    recv_type(&mut ws, "rooms").await;
    ws
}

async fn send_json(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

async fn recv_message(ws: &mut Client) -> Message {
    tokio::time::timeout(RECV_TIMEOUT, ws.next())
        .await
        .expect("timed out waiting for a frame")
        .expect("stream ended")
        .expect("websocket error")
}

/// Read frames until one of `kind` satisfies `predicate`.
async fn recv_matching(ws: &mut Client, kind: &str, predicate: impl Fn(&Value) -> bool) -> Value {
    loop {
        match recv_message(ws).await {
            Message::Text(text) => {
                let value: Value = serde_json::from_str(&text).unwrap();
                if value["type"] == kind && predicate(&value) {
                    return value;
                }
            }
            Message::Close(frame) => panic!("connection closed while waiting for {kind}: {frame:?}"),
            _ => {}
        }
    }
}

async fn recv_type(ws: &mut Client, kind: &str) -> Value {
    recv_matching(ws, kind, |_| true).await
}

async fn join(ws: &mut Client, room_id: &str, password: &str, nickname: &str) -> Value {
    send_json(
        ws,
        json!({"type": "join", "roomId": room_id, "password": password, "nickname": nickname}),
    )
    .await;
    recv_type(ws, "joined").await
}

#[tokio::test]
async fn test_lobby_receives_room_list_on_connect() {
    // テスト項目: 接続直後にルーム一覧が届く
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;

    // when (操作):
    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();

    // then (期待する結果):
    let rooms = recv_type(&mut ws, "rooms").await;
    assert_eq!(rooms["rooms"], json!([]));
}

#[tokio::test]
async fn test_first_join_creates_room() {
    // テスト項目: 最初の join でルームが作成され、joined が返る
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;

    // when (操作):
    let joined = join(&mut a, "team", "", "alice").await;

    // then (期待する結果):
    assert_eq!(joined["roomId"], "team");
    assert_eq!(joined["connectionId"], "1");
    assert_eq!(joined["count"], 1);

    let state = recv_type(&mut a, "room-state").await;
    assert_eq!(state["count"], 1);
    assert_eq!(state["participants"][0]["nickname"], "alice");
    assert_eq!(state["participants"][0]["isOwner"], true);
}

#[tokio::test]
async fn test_second_member_sees_shared_room_state() {
    // テスト項目: 2 人目の参加後、両者に count 2 の room-state が届き、所有者は最初の参加者のみ
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    join(&mut a, "team", "pw", "alice").await;

    // when (操作):
    let joined = join(&mut b, "team", "pw", "bob").await;

    // then (期待する結果):
    assert_eq!(joined["count"], 2);
    for ws in [&mut a, &mut b] {
        let state = recv_matching(ws, "room-state", |v| v["count"] == 2).await;
        let participants = state["participants"].as_array().unwrap();
        assert_eq!(participants.len(), 2);
        assert_eq!(participants[0]["nickname"], "alice");
        assert_eq!(participants[0]["isOwner"], true);
        assert_eq!(participants[1]["nickname"], "bob");
        assert_eq!(participants[1]["isOwner"], false);
    }
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    // テスト項目: パスワードが異なる join はエラーになり、ルームの人数は変わらない
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    join(&mut a, "secret-room", "right", "alice").await;

    // when (操作):
    send_json(
        &mut b,
        json!({"type": "join", "roomId": "secret-room", "password": "wrong"}),
    )
    .await;

    // then (期待する結果):
    let error = recv_type(&mut b, "error").await;
    assert_eq!(error["message"], "Wrong password for this room.");

    let client = reqwest::Client::new();
    let body: Value = client
        .get(format!("http://{}/api/rooms", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["rooms"][0]["count"], 1);
    assert_eq!(body["rooms"][0]["hasPassword"], true);
}

#[tokio::test]
async fn test_signal_is_relayed_to_target() {
    // テスト項目: signal は同じルームの宛先にのみ、送信元 ID 付きで中継される
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    join(&mut a, "call", "", "alice").await;
    let joined = join(&mut b, "call", "", "bob").await;
    let target = joined["connectionId"].as_str().unwrap().to_string();

    // when (操作):
    send_json(
        &mut a,
        json!({
            "type": "signal",
            "roomId": "call",
            "targetId": target,
            "payload": {"type": "offer", "sdp": "v=0"}
        }),
    )
    .await;

    // then (期待する結果):
    let signal = recv_type(&mut b, "signal").await;
    assert_eq!(signal["from"], "1");
    assert_eq!(signal["payload"], json!({"type": "offer", "sdp": "v=0"}));
}

#[tokio::test]
async fn test_ping_is_answered_with_pong() {
    // テスト項目: ping の ts がそのまま pong で返る
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    join(&mut a, "team", "", "alice").await;

    // when (操作):
    send_json(&mut a, json!({"type": "ping", "ts": 1_700_000_000_000_i64})).await;

    // then (期待する結果):
    let pong = recv_type(&mut a, "pong").await;
    assert_eq!(pong["ts"], 1_700_000_000_000_i64);
}

#[tokio::test]
async fn test_extreme_ping_ts_keeps_connection_alive() {
    // テスト項目: 表現できない ts の ping でも接続は維持され、pong はサーバー時刻で返る
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    join(&mut a, "team", "", "alice").await;

    // when (操作):
    a.send(Message::Text(r#"{"type":"ping","ts":-1e300}"#.into()))
        .await
        .unwrap();
    send_json(&mut a, json!({"type": "ping", "ts": 42})).await;

    // then (期待する結果):
    let first = recv_type(&mut a, "pong").await;
    assert!(first["ts"].as_i64().unwrap() > 1_600_000_000_000);
    let second = recv_type(&mut a, "pong").await;
    assert_eq!(second["ts"], 42);
}

#[tokio::test]
async fn test_owner_kicks_member() {
    // テスト項目: 所有者の kick で対象に kicked が届いて切断され、残りの参加者は count 1 を受け取る
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    join(&mut a, "team", "", "alice").await;
    let joined = join(&mut b, "team", "", "bob").await;
    let target = joined["connectionId"].as_str().unwrap().to_string();
    recv_matching(&mut a, "room-state", |v| v["count"] == 2).await;

    // when (操作):
    send_json(&mut a, json!({"type": "kick", "targetId": target})).await;

    // then (期待する結果):
    let kicked = recv_type(&mut b, "kicked").await;
    assert_eq!(kicked["roomId"], "team");
    loop {
        if let Message::Close(frame) = recv_message(&mut b).await {
            assert_eq!(u16::from(frame.unwrap().code), 1000);
            break;
        }
    }

    let state = recv_matching(&mut a, "room-state", |v| v["count"] == 1).await;
    assert_eq!(state["participants"][0]["nickname"], "alice");
}

#[tokio::test]
async fn test_non_owner_kick_is_ignored() {
    // テスト項目: 所有者以外の kick は何も起こさない
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    let mut b = connect(addr).await;
    join(&mut a, "team", "", "alice").await;
    join(&mut b, "team", "", "bob").await;

    // when (操作):
    send_json(&mut b, json!({"type": "kick", "targetId": "1"})).await;
    send_json(&mut a, json!({"type": "ping", "ts": 42})).await;

    // then (期待する結果):
    // a は切断されずに pong を受け取れる
    let pong = recv_type(&mut a, "pong").await;
    assert_eq!(pong["ts"], 42);
}

#[tokio::test]
async fn test_oversize_frame_closes_connection() {
    // テスト項目: 上限を超えるフレームはエラー通知の後 1009 で切断される
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;

    // when (操作):
    let oversize = "x".repeat(MAX_FRAME_BYTES + 1);
    a.send(Message::Text(oversize.into())).await.unwrap();

    // then (期待する結果):
    let error = recv_type(&mut a, "error").await;
    assert_eq!(
        error["message"],
        "Message too large. Connection closed by server."
    );
    match recv_message(&mut a).await {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 1009),
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_disallowed_origin_is_closed() {
    // テスト項目: 許可されていない Origin からの接続は 1008 で閉じられる
    // given (前提条件):
    let config = ServerConfig {
        allowed_origin: Some("https://app.example.com".to_string()),
        ..ServerConfig::default()
    };
    let addr = start_server(config).await;
    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    request
        .headers_mut()
        .insert("Origin", HeaderValue::from_static("https://evil.example.com"));

    // when (操作):
    let (mut ws, _) = connect_async(request).await.unwrap();

    // then (期待する結果):
    match recv_message(&mut ws).await {
        Message::Close(Some(frame)) => {
            assert_eq!(u16::from(frame.code), 1008);
            assert_eq!(frame.reason.as_str(), "Origin not allowed");
        }
        other => panic!("expected close frame, got {other:?}"),
    }
}

#[tokio::test]
async fn test_room_is_deleted_after_last_member_leaves() {
    // テスト項目: 最後の参加者が切断するとルームが一覧から消える
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let mut a = connect(addr).await;
    let mut lobby = connect(addr).await;
    join(&mut a, "short-lived", "", "alice").await;
    recv_matching(&mut lobby, "rooms", |v| v["rooms"].as_array().unwrap().len() == 1).await;

    // when (操作):
    a.close(None).await.unwrap();

    // then (期待する結果):
    let rooms = recv_matching(&mut lobby, "rooms", |v| {
        v["rooms"].as_array().unwrap().is_empty()
    })
    .await;
    assert_eq!(rooms["rooms"], json!([]));
}

#[tokio::test]
async fn test_http_endpoints() {
    // テスト項目: health は ok、TURN 未設定時の /api/turn は 204、セキュリティヘッダーが付く
    // given (前提条件):
    let addr = start_server(ServerConfig::default()).await;
    let client = reqwest::Client::new();

    // when (操作):
    let health = client
        .get(format!("http://{}/api/health", addr))
        .send()
        .await
        .unwrap();
    let turn = client
        .get(format!("http://{}/api/turn", addr))
        .send()
        .await
        .unwrap();

    // then (期待する結果):
    assert_eq!(health.status(), reqwest::StatusCode::OK);
    assert_eq!(
        health.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    let body: Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(turn.status(), reqwest::StatusCode::NO_CONTENT);
}
