//! UseCase: ニックネーム・ミュート状態の更新

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRepository, StateUpdate};

use super::presence::PresenceBroadcaster;

pub struct UpdateStateUseCase {
    repository: Arc<dyn RoomRepository>,
    presence: PresenceBroadcaster,
}

impl UpdateStateUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence: PresenceBroadcaster::new(repository.clone(), message_pusher),
            repository,
        }
    }

    /// 参加中でなければ何もせず `None` を返す
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        update: StateUpdate,
    ) -> Option<RoomId> {
        let room_id = self.repository.update_state(connection_id, update).await?;
        if let Err(e) = self.presence.broadcast_room_state(&room_id).await {
            tracing::warn!("Failed to broadcast room state: {}", e);
        }
        Some(room_id)
    }
}
