//! UseCase: オーナーによる参加者の強制退出
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - KickParticipantUseCase::execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - kick は他人の接続を切断できる唯一の操作であり、オーナー以外には
//!   観測可能な影響を一切与えてはならない
//!
//! ### どのような状況を想定しているか
//! - 正常系：オーナーが同じルームの参加者を kick
//! - 異常系：オーナー以外による kick、存在しないターゲット

use std::sync::Arc;

use crate::domain::{CloseReason, ConnectionId, MessagePusher, Notification, RoomId, RoomRepository};

use super::error::KickError;

/// 強制退出のユースケース
pub struct KickParticipantUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
}

impl KickParticipantUseCase {
    /// 新しい KickParticipantUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 強制退出を実行
    ///
    /// ターゲットに `kicked` を送信してから接続を閉じる。ルームからの削除は
    /// ターゲットの接続が閉じた時点で切断処理が行う。
    ///
    /// # Returns
    ///
    /// * `Ok(RoomId)` - kick したルーム
    /// * `Err(KickError::NotAllowed)` - 要求者がオーナーでない、またはターゲットがいない
    pub async fn execute(
        &self,
        requester: &ConnectionId,
        target_id: &ConnectionId,
    ) -> Result<RoomId, KickError> {
        let room_id = self
            .repository
            .kick_target(requester, target_id)
            .await
            .ok_or(KickError::NotAllowed)?;

        self.message_pusher
            .push_to(
                target_id,
                &Notification::Kicked {
                    room_id: room_id.clone(),
                },
            )
            .await
            .map_err(|e| KickError::DeliveryFailed(e.to_string()))?;
        self.message_pusher
            .close(target_id, CloseReason::Kicked)
            .await
            .map_err(|e| KickError::DeliveryFailed(e.to_string()))?;

        tracing::info!(
            "Connection {} kicked connection {} from room '{}'",
            requester,
            target_id,
            room_id
        );
        Ok(room_id)
    }
}
