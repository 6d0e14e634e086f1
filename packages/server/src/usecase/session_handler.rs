//! 接続ごとのプロトコル状態機械
//!
//! ```text
//! Connected ──join──▶ Joined(room) ──join──▶ Joined(other room)
//!     │                    │
//!     └──── close ─────────┴──▶ Closed
//! ```
//!
//! 受信したフレームはまずサイズ・レート制限を通り、その後に解析・検証されてから
//! `dispatch` に渡される。どの段階で破棄されてもサーバーは止まらない。

use std::sync::Arc;

use yoriai_shared::time::Clock;

use crate::domain::{
    ClientCommand, CloseReason, ConnectionId, FrameGuard, MessagePusher, Notification,
    RoomId, RoomRepository, StateUpdate, Timestamp,
};

use super::{
    join_room::JoinRoomUseCase, kick_participant::KickParticipantUseCase,
    record_ping::RecordPingUseCase, send_signal::SendSignalUseCase,
    update_state::UpdateStateUseCase,
};

/// State of one connection as seen by its own handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Joined(RoomId),
    Closed,
}

/// What the transport should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerdict {
    Continue,
    /// The connection was told why and a close is queued; stop reading.
    Close(CloseReason),
}

/// Use cases reachable from inbound protocol messages, shared by every connection.
pub struct ProtocolUseCases {
    pub join_room: JoinRoomUseCase,
    pub send_signal: SendSignalUseCase,
    pub update_state: UpdateStateUseCase,
    pub record_ping: RecordPingUseCase,
    pub kick_participant: KickParticipantUseCase,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl ProtocolUseCases {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            join_room: JoinRoomUseCase::new(repository.clone(), message_pusher.clone()),
            send_signal: SendSignalUseCase::new(repository.clone(), message_pusher.clone()),
            update_state: UpdateStateUseCase::new(repository.clone(), message_pusher.clone()),
            record_ping: RecordPingUseCase::new(
                repository.clone(),
                message_pusher.clone(),
                clock.clone(),
            ),
            kick_participant: KickParticipantUseCase::new(repository, message_pusher.clone()),
            message_pusher,
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

/// Protocol handler owned by one connection's receive task.
pub struct SessionHandler {
    connection_id: ConnectionId,
    state: ConnectionState,
    guard: FrameGuard,
    usecases: Arc<ProtocolUseCases>,
}

impl SessionHandler {
    pub fn new(connection_id: ConnectionId, usecases: Arc<ProtocolUseCases>) -> Self {
        Self {
            connection_id,
            state: ConnectionState::Connected,
            guard: FrameGuard::new(usecases.now()),
            usecases,
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Apply the size and rate limits to an inbound frame before it is parsed.
    ///
    /// On violation the client gets an `error` frame followed by a close, and the
    /// handler moves to `Closed`.
    pub async fn admit(&mut self, frame_len: usize) -> FrameVerdict {
        let reason = match self.guard.admit(frame_len, self.usecases.now()) {
            Ok(()) => return FrameVerdict::Continue,
            Err(reason) => reason,
        };

        tracing::warn!(
            "Closing connection {}: {} ({} bytes)",
            self.connection_id,
            reason,
            frame_len
        );
        let pusher = &self.usecases.message_pusher;
        if let Some(message) = reason.client_message()
            && let Err(e) = pusher
                .push_to(&self.connection_id, &Notification::error(message))
                .await
        {
            tracing::debug!("Failed to push error to connection {}: {}", self.connection_id, e);
        }
        if let Err(e) = pusher.close(&self.connection_id, reason).await {
            tracing::debug!("Failed to close connection {}: {}", self.connection_id, e);
        }
        self.state = ConnectionState::Closed;
        FrameVerdict::Close(reason)
    }

    /// Run one validated protocol message.
    pub async fn dispatch(&mut self, command: ClientCommand) {
        let joined = match &self.state {
            ConnectionState::Closed => return,
            ConnectionState::Connected => false,
            ConnectionState::Joined(_) => true,
        };

        match command {
            ClientCommand::Join {
                room_id,
                password,
                nickname,
                user_id,
            } => {
                if let Ok(outcome) = self
                    .usecases
                    .join_room
                    .execute(self.connection_id, room_id, password, nickname, user_id)
                    .await
                {
                    self.state = ConnectionState::Joined(outcome.room_id);
                }
            }

            ClientCommand::Ping { ts } => {
                self.usecases
                    .record_ping
                    .execute(&self.connection_id, ts)
                    .await;
            }

            command if !joined => {
                tracing::debug!(
                    "Ignored '{}' from connection {} before join",
                    command.kind(),
                    self.connection_id
                );
            }

            ClientCommand::Signal {
                room_id,
                target_id,
                payload,
            } => {
                if let Err(e) = self
                    .usecases
                    .send_signal
                    .execute(self.connection_id, &room_id, &target_id, payload)
                    .await
                {
                    tracing::debug!(
                        "Dropped signal from connection {} to {}: {}",
                        self.connection_id,
                        target_id,
                        e
                    );
                }
            }

            ClientCommand::State { nickname, muted } => {
                self.usecases
                    .update_state
                    .execute(&self.connection_id, StateUpdate { nickname, muted })
                    .await;
            }

            ClientCommand::Kick { target_id } => {
                if let Err(e) = self
                    .usecases
                    .kick_participant
                    .execute(&self.connection_id, &target_id)
                    .await
                {
                    tracing::debug!(
                        "Ignored kick of {} by connection {}: {}",
                        target_id,
                        self.connection_id,
                        e
                    );
                }
            }
        }
    }

    /// The transport is gone; nothing else is processed.
    pub fn close(&mut self) {
        self.state = ConnectionState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            MAX_FRAME_BYTES, Nickname, Outbound, Password, RatePolicy, UserId,
        },
        infrastructure::{
            message_pusher::WebSocketMessagePusher, repository::InMemoryRoomRepository,
        },
    };
    use serde_json::{Value, json};
    use tokio::sync::mpsc;
    use yoriai_shared::time::ManualClock;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - SessionHandler の状態遷移とメッセージの振り分け
    // - サイズ・レート制限による強制切断
    //
    // 【なぜこのテストが必要か】
    // - 状態ごとに受け付けるメッセージが異なり、不正な状態のメッセージは黙って破棄される
    // - 制限違反は error フレームの後に close される必要がある
    //
    // 【どのようなシナリオをテストするか】
    // 1. Connected → Joined の遷移と、join 失敗時に状態が変わらないこと
    // 2. join 前の signal / state / kick が無視されること
    // 3. 64 KiB 超のフレーム・241 通目のメッセージで close されること
    // ========================================

    struct Fixture {
        repository: Arc<InMemoryRoomRepository>,
        pusher: Arc<WebSocketMessagePusher>,
        usecases: Arc<ProtocolUseCases>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(1_000_000));
            let repository = Arc::new(InMemoryRoomRepository::new(clock.clone()));
            let pusher = Arc::new(WebSocketMessagePusher::default());
            let usecases = Arc::new(ProtocolUseCases::new(
                repository.clone(),
                pusher.clone(),
                clock.clone(),
            ));
            Self {
                repository,
                pusher,
                usecases,
                clock,
            }
        }

        async fn connect(&self) -> (SessionHandler, mpsc::UnboundedReceiver<Outbound>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let id = self.repository.open_connection().await;
            self.pusher.register_client(id, tx).await;
            (SessionHandler::new(id, self.usecases.clone()), rx)
        }
    }

    fn join(room: &str, user: &str) -> ClientCommand {
        ClientCommand::Join {
            room_id: RoomId::new(room.to_string()).ok(),
            password: Password::none(),
            nickname: None,
            user_id: UserId::new(user.to_string()).ok(),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut items = Vec::new();
        while let Ok(item) = rx.try_recv() {
            items.push(item);
        }
        items
    }

    fn frame(item: &Outbound) -> Value {
        match item {
            Outbound::Frame(text) => serde_json::from_str(text).unwrap(),
            Outbound::Close(reason) => panic!("unexpected close: {reason}"),
        }
    }

    #[tokio::test]
    async fn test_join_moves_to_joined() {
        // テスト項目: join の成功で Connected から Joined に遷移する
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut session, _rx) = fixture.connect().await;
        assert_eq!(session.state(), &ConnectionState::Connected);

        // when (操作):
        session.dispatch(join("x", "alice")).await;

        // then (期待する結果):
        assert_eq!(
            session.state(),
            &ConnectionState::Joined(RoomId::new("x".to_string()).unwrap())
        );
    }

    #[tokio::test]
    async fn test_failed_join_keeps_state() {
        // テスト項目: join の失敗では状態が変わらない
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut session, mut rx) = fixture.connect().await;

        // when (操作):
        session
            .dispatch(ClientCommand::Join {
                room_id: None,
                password: Password::none(),
                nickname: Some(Nickname::new("A".to_string()).unwrap()),
                user_id: None,
            })
            .await;

        // then (期待する結果):
        assert_eq!(session.state(), &ConnectionState::Connected);
        assert_eq!(frame(&drain(&mut rx)[0])["type"], "error");
    }

    #[tokio::test]
    async fn test_messages_before_join_are_ignored() {
        // テスト項目: join 前の signal・state・kick は何も起こさない
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut alice, mut alice_rx) = fixture.connect().await;
        let (mut bob, mut bob_rx) = fixture.connect().await;
        alice.dispatch(join("x", "alice")).await;
        drain(&mut alice_rx);

        // when (操作):
        bob.dispatch(ClientCommand::Signal {
            room_id: RoomId::new("x".to_string()).unwrap(),
            target_id: alice.connection_id(),
            payload: json!({"type": "offer"}),
        })
        .await;
        bob.dispatch(ClientCommand::State {
            nickname: None,
            muted: Some(true),
        })
        .await;
        bob.dispatch(ClientCommand::Kick {
            target_id: alice.connection_id(),
        })
        .await;

        // then (期待する結果):
        assert!(drain(&mut alice_rx).is_empty());
        assert!(drain(&mut bob_rx).is_empty());
        assert_eq!(bob.state(), &ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_signal_between_members_is_relayed() {
        // テスト項目: 同じルームの参加者間でシグナルが中継され、from に送信元が入る
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut alice, mut alice_rx) = fixture.connect().await;
        let (mut bob, mut bob_rx) = fixture.connect().await;
        alice.dispatch(join("x", "alice")).await;
        bob.dispatch(join("x", "bob")).await;
        drain(&mut alice_rx);
        drain(&mut bob_rx);

        // when (操作):
        alice
            .dispatch(ClientCommand::Signal {
                room_id: RoomId::new("x".to_string()).unwrap(),
                target_id: bob.connection_id(),
                payload: json!({"type": "answer", "sdp": "v=0"}),
            })
            .await;

        // then (期待する結果):
        let received = drain(&mut bob_rx);
        assert_eq!(
            frame(&received[0]),
            json!({"type": "signal", "from": "1", "payload": {"type": "answer", "sdp": "v=0"}})
        );
        assert!(drain(&mut alice_rx).is_empty());
    }

    #[tokio::test]
    async fn test_ping_is_answered_in_any_state() {
        // テスト項目: ping は join 前でも pong が返る
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut session, mut rx) = fixture.connect().await;

        // when (操作):
        session.dispatch(ClientCommand::Ping { ts: Some(123) }).await;

        // then (期待する結果):
        assert_eq!(frame(&drain(&mut rx)[0]), json!({"type": "pong", "ts": 123}));
    }

    #[tokio::test]
    async fn test_oversize_frame_closes_with_1009() {
        // テスト項目: 64 KiB を超えるフレームで error が送られた後 1009 で close される
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut session, mut rx) = fixture.connect().await;

        // when (操作):
        let verdict = session.admit(MAX_FRAME_BYTES + 1).await;

        // then (期待する結果):
        assert_eq!(verdict, FrameVerdict::Close(CloseReason::MessageTooBig));
        assert_eq!(session.state(), &ConnectionState::Closed);
        let received = drain(&mut rx);
        assert_eq!(
            frame(&received[0]),
            json!({"type": "error", "message": "Message too large. Connection closed by server."})
        );
        assert_eq!(received[1], Outbound::Close(CloseReason::MessageTooBig));
        assert_eq!(CloseReason::MessageTooBig.code(), 1009);
    }

    #[tokio::test]
    async fn test_rate_limit_closes_after_error() {
        // テスト項目: 1 ウィンドウで 240 通を超えると error の後に close される
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut session, mut rx) = fixture.connect().await;
        for _ in 0..RatePolicy::WEBSOCKET.max_messages {
            assert_eq!(session.admit(16).await, FrameVerdict::Continue);
        }

        // when (操作):
        let verdict = session.admit(16).await;

        // then (期待する結果):
        assert_eq!(verdict, FrameVerdict::Close(CloseReason::RateLimited));
        let received = drain(&mut rx);
        assert_eq!(frame(&received[0])["type"], "error");
        assert_eq!(received[1], Outbound::Close(CloseReason::RateLimited));
    }

    #[tokio::test]
    async fn test_rate_window_resets_after_a_minute() {
        // テスト項目: 60 秒経過後はカウンタがリセットされ、再び受け付けられる
        // given (前提条件):
        let fixture = Fixture::new();
        let (mut session, _rx) = fixture.connect().await;
        for _ in 0..RatePolicy::WEBSOCKET.max_messages {
            session.admit(16).await;
        }

        // when (操作):
        fixture.clock.advance(RatePolicy::WEBSOCKET.window_ms + 1);
        let verdict = session.admit(16).await;

        // then (期待する結果):
        assert_eq!(verdict, FrameVerdict::Continue);
    }
}
