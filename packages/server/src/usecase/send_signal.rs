//! UseCase: シグナル転送処理
//!
//! ペイロードは検証済み（文字列の `type` を持つオブジェクト）で、内容には立ち入らずに
//! そのまま転送する。送信元とターゲットが同じルームにいない場合は黙って破棄する。

use std::sync::Arc;

use serde_json::Value;

use crate::domain::{ConnectionId, MessagePusher, Notification, RoomId, RoomRepository};

use super::error::SignalError;

/// シグナル転送のユースケース
pub struct SendSignalUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendSignalUseCase {
    /// 新しい SendSignalUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    pub async fn execute(
        &self,
        from: ConnectionId,
        room_id: &RoomId,
        target_id: &ConnectionId,
        payload: Value,
    ) -> Result<(), SignalError> {
        if !self.repository.signal_route(&from, room_id, target_id).await {
            return Err(SignalError::NotRouted(room_id.to_string()));
        }

        self.message_pusher
            .push_to(target_id, &Notification::Signal { from, payload })
            .await
            .map_err(|e| SignalError::DeliveryFailed(e.to_string()))
    }
}
