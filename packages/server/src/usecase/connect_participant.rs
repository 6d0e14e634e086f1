//! UseCase: 接続開始処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 接続 ID の払い出し、送信チャンネルの登録、初回のルーム一覧送信
//!
//! ### なぜこのテストが必要か
//! - ロビーを表示するクライアントは join 前にルーム一覧を受け取る必要がある
//! - 送信チャンネルの登録前に通知が送られると、最初のルーム一覧が失われる
//!
//! ### どのような状況を想定しているか
//! - 正常系：ルームが無い状態・ある状態での接続

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel, RoomRepository};

use super::presence::PresenceBroadcaster;

/// 接続開始のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    presence: PresenceBroadcaster,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
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

    /// 接続開始を実行
    ///
    /// # Arguments
    ///
    /// * `channel` - この接続への送信チャンネル
    ///
    /// # Returns
    ///
    /// 払い出された接続 ID
    pub async fn execute(&self, channel: PusherChannel) -> ConnectionId {
        // 1. 接続 ID を払い出し、全接続の集合に登録
        let connection_id = self.repository.open_connection().await;

        // 2. MessagePusher に送信チャンネルを登録
        self.message_pusher
            .register_client(connection_id, channel)
            .await;

        // 3. 現在のルーム一覧を送信
        if let Err(e) = self.presence.push_room_list_to(&connection_id).await {
            tracing::warn!(
                "Failed to push room list to connection {}: {}",
                connection_id,
                e
            );
        }

        connection_id
    }
}
