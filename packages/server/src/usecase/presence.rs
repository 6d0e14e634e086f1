//! Presence broadcast
//!
//! 状態を変更した全ての UseCase の最後に呼ばれ、ルームのスナップショットと
//! ルーム一覧を関係する接続へ送信する。スナップショットは Repository のロック内で
//! コピーされ、送信はロックの外で行われる。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, Notification, RoomId, RoomRepository};

pub struct PresenceBroadcaster {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl PresenceBroadcaster {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// `room-state` をルームの全参加者へ送信。ルームが既に無ければ何もしない
    pub async fn broadcast_room_state(&self, room_id: &RoomId) -> Result<(), MessagePushError> {
        let Some(snapshot) = self.repository.snapshot(room_id).await else {
            return Ok(());
        };
        let targets: Vec<ConnectionId> = snapshot
            .participants
            .iter()
            .map(|participant| participant.connection_id)
            .collect();
        self.message_pusher
            .broadcast(targets, &Notification::RoomState(snapshot))
            .await
    }

    /// `rooms` をルーム未参加を含む全接続へ送信
    pub async fn broadcast_room_list(&self) -> Result<(), MessagePushError> {
        let rooms = self.repository.list_rooms().await;
        let targets = self.repository.connection_ids().await;
        self.message_pusher
            .broadcast(targets, &Notification::Rooms(rooms))
            .await
    }

    /// `rooms` を 1 接続へ送信
    pub async fn push_room_list_to(
        &self,
        connection_id: &ConnectionId,
    ) -> Result<(), MessagePushError> {
        let rooms = self.repository.list_rooms().await;
        self.message_pusher
            .push_to(connection_id, &Notification::Rooms(rooms))
            .await
    }
}
