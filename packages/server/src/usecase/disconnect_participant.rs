//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectParticipantUseCase::execute() メソッド
//! - ルームからの退出、送信チャンネルの登録解除、残りの接続への通知
//!
//! ### なぜこのテストが必要か
//! - 切断はクライアントの操作ではなくトランスポートの事象として必ず 1 回起きる
//! - 最後の参加者の切断でルームが消え、ロビーの一覧からも消えることを保証する
//!
//! ### どのような状況を想定しているか
//! - 正常系：参加者が残るルームからの切断
//! - エッジケース：最後の参加者の切断、ルーム未参加の接続の切断

use std::sync::Arc;

use crate::domain::{ConnectionId, Departure, MessagePusher, RoomRepository};

use super::presence::PresenceBroadcaster;

/// 切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    presence: PresenceBroadcaster,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            presence: PresenceBroadcaster::new(repository.clone(), message_pusher.clone()),
            repository,
            message_pusher,
        }
    }

    /// 切断を実行
    ///
    /// # Returns
    ///
    /// 参加していたルームからの退出結果（ルーム未参加なら `None`）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Option<Departure> {
        // 1. Registry から削除（最後の 1 人ならルームも削除）
        let departure = self.repository.close_connection(connection_id).await;

        // 2. 送信チャンネルを破棄
        self.message_pusher.unregister_client(connection_id).await;

        // 3. 残りの参加者と全接続に通知
        if let Some(departure) = &departure {
            tracing::info!(
                "Connection {} left room '{}' ({} remaining)",
                connection_id,
                departure.room_id,
                departure.remaining
            );
            if !departure.room_deleted()
                && let Err(e) = self.presence.broadcast_room_state(&departure.room_id).await
            {
                tracing::warn!("Failed to broadcast room state: {}", e);
            }
        }
        if let Err(e) = self.presence.broadcast_room_list().await {
            tracing::warn!("Failed to broadcast room list: {}", e);
        }

        departure
    }
}
