//! UseCase: ルーム参加処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() メソッド
//! - デフォルト値の適用、参加結果の通知、古いセッションの切断
//!
//! ### なぜこのテストが必要か
//! - join はルームの作成・定員・オーナー・再接続の全てに関わる唯一の入口
//! - 拒否された join は送信者への error 以外に何も送ってはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：作成、参加、別ルームへの移動
//! - 異常系：無効なルーム ID、パスワード不一致
//! - エッジケース：同一ユーザーの再接続による置き換え

use std::sync::Arc;

use crate::domain::{
    CloseReason, ConnectionId, JoinError, JoinOutcome, JoinRequest, MessagePusher, Nickname,
    Notification, Password, RoomId, RoomRepository, UserId,
};

use super::presence::PresenceBroadcaster;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    presence: PresenceBroadcaster,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
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

    /// ルーム参加を実行
    ///
    /// 拒否された場合は送信者に `error` を送信してからエラーを返す。
    ///
    /// # Arguments
    ///
    /// * `connection_id` - 参加する接続
    /// * `room_id` - 検証済みのルーム ID（無効な場合は `None`）
    /// * `password` - 提示されたパスワード（無ければ空）
    /// * `nickname` - 省略時は `Guest-<接続 ID>`
    /// * `user_id` - 省略時は接続 ID
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        room_id: Option<RoomId>,
        password: Password,
        nickname: Option<Nickname>,
        user_id: Option<UserId>,
    ) -> Result<JoinOutcome, JoinError> {
        let result = match room_id {
            Some(room_id) => {
                let request = JoinRequest {
                    room_id,
                    password,
                    user_id: user_id.unwrap_or_else(|| UserId::from_connection(connection_id)),
                    nickname: nickname.unwrap_or_else(|| Nickname::guest(connection_id)),
                };
                self.repository.create_or_join(connection_id, request).await
            }
            None => Err(JoinError::InvalidRoomId),
        };

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::info!("Connection {} join refused: {}", connection_id, e);
                self.notify(&connection_id, &Notification::error(e.to_string()))
                    .await;
                return Err(e);
            }
        };

        tracing::info!(
            "Connection {} joined room '{}' ({} member(s){})",
            connection_id,
            outcome.room_id,
            outcome.count,
            if outcome.created { ", created" } else { "" }
        );

        // 同じユーザーの古いセッションは既にルームから外れているので、接続を閉じる
        for evicted in &outcome.evicted {
            tracing::info!(
                "Connection {} replaced by connection {}",
                evicted,
                connection_id
            );
            if let Err(e) = self
                .message_pusher
                .close(evicted, CloseReason::Replaced)
                .await
            {
                tracing::debug!("Replaced connection {} already gone: {}", evicted, e);
            }
        }

        self.notify(
            &connection_id,
            &Notification::Joined {
                room_id: outcome.room_id.clone(),
                connection_id,
                count: outcome.count,
            },
        )
        .await;

        if let Err(e) = self.presence.broadcast_room_state(&outcome.room_id).await {
            tracing::warn!("Failed to broadcast room state: {}", e);
        }
        if let Some(previous) = &outcome.previous_room
            && !previous.room_deleted()
            && let Err(e) = self.presence.broadcast_room_state(&previous.room_id).await
        {
            tracing::warn!("Failed to broadcast room state: {}", e);
        }
        if let Err(e) = self.presence.broadcast_room_list().await {
            tracing::warn!("Failed to broadcast room list: {}", e);
        }

        Ok(outcome)
    }

    async fn notify(&self, connection_id: &ConnectionId, notification: &Notification) {
        if let Err(e) = self.message_pusher.push_to(connection_id, notification).await {
            tracing::debug!("Failed to push to connection {}: {}", connection_id, e);
        }
    }
}
