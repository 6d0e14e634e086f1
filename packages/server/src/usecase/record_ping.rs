//! UseCase: ping 処理
//!
//! 送信者へ `pong` を返し、参加中であればルームの全員に最新のレイテンシを配信する。

use std::sync::Arc;

use yoriai_shared::time::Clock;

use crate::domain::{ConnectionId, MessagePusher, Notification, RoomId, RoomRepository};

use super::presence::PresenceBroadcaster;

pub struct RecordPingUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    presence: PresenceBroadcaster,
    clock: Arc<dyn Clock>,
}

impl RecordPingUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            presence: PresenceBroadcaster::new(repository.clone(), message_pusher.clone()),
            repository,
            message_pusher,
            clock,
        }
    }

    /// `ts` が無い場合（0 や範囲外の値を含む）はサーバーの現在時刻を `pong` で返す
    pub async fn execute(&self, connection_id: &ConnectionId, ts: Option<i64>) -> Option<RoomId> {
        let room_id = self.repository.record_ping(connection_id, ts).await;

        let pong = Notification::Pong {
            ts: ts.unwrap_or_else(|| self.clock.now_millis()),
        };
        if let Err(e) = self.message_pusher.push_to(connection_id, &pong).await {
            tracing::debug!("Failed to push pong to connection {}: {}", connection_id, e);
        }

        if let Some(room_id) = &room_id
            && let Err(e) = self.presence.broadcast_room_state(room_id).await
        {
            tracing::warn!("Failed to broadcast room state: {}", e);
        }

        room_id
    }
}
