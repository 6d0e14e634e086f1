//! UseCase: ルーム一覧取得処理

use std::sync::Arc;

use crate::domain::{RoomRepository, RoomSummary};

/// ルーム一覧取得のユースケース
pub struct GetRoomsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    /// 新しい GetRoomsUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// ルーム一覧を取得（ルーム ID 順）
    pub async fn execute(&self) -> Vec<RoomSummary> {
        self.repository.list_rooms().await
    }
}
