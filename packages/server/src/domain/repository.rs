//! Repository trait 定義
//!
//! ルームと接続の状態（Room Registry）へのインターフェース。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 原子性
//!
//! 各メソッドは 1 回の呼び出しで完結する操作として実装されなければならない。
//! 「定員チェック → 追加」「同一ユーザーの退出 → 追加」を 2 回の呼び出しに
//! 分けると、並行する join の間で不変条件が壊れる。

use async_trait::async_trait;

use super::{
    ConnectionId, JoinError, Nickname, Password, RoomId, RoomSnapshot, RoomSummary, UserId,
};

/// Validated join parameters with defaults already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub room_id: RoomId,
    pub password: Password,
    pub user_id: UserId,
    pub nickname: Nickname,
}

/// Membership removed from a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    /// Members left behind; zero means the room was deleted.
    pub remaining: usize,
}

impl Departure {
    pub fn room_deleted(&self) -> bool {
        self.remaining == 0
    }
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    pub count: usize,
    pub created: bool,
    /// Older sessions of the same user, already removed from the room. Their
    /// connections still have to be closed.
    pub evicted: Vec<ConnectionId>,
    /// Set when the connection moved here from another room.
    pub previous_room: Option<Departure>,
}

/// Fields of a `state` message; `None` leaves the current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub nickname: Option<Nickname>,
    pub muted: Option<bool>,
}

/// Room Registry trait
///
/// UseCase 層はこの trait に依存し、Infrastructure 層の具体的な実装には依存しない。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 新しい接続 ID を払い出し、全接続の集合に登録
    async fn open_connection(&self) -> ConnectionId;

    /// ルームから退出させ、全接続の集合からも削除
    async fn close_connection(&self, connection_id: &ConnectionId) -> Option<Departure>;

    /// ルームに参加（存在しなければ作成）
    async fn create_or_join(
        &self,
        connection_id: ConnectionId,
        request: JoinRequest,
    ) -> Result<JoinOutcome, JoinError>;

    /// ルームから退出（最後の 1 人ならルームを削除）
    async fn leave(&self, connection_id: &ConnectionId) -> Option<Departure>;

    /// ニックネーム・ミュート状態を更新。参加中のルームを返す
    async fn update_state(
        &self,
        connection_id: &ConnectionId,
        update: StateUpdate,
    ) -> Option<RoomId>;

    /// ping を記録。参加中のルームを返す
    async fn record_ping(
        &self,
        connection_id: &ConnectionId,
        client_ts: Option<i64>,
    ) -> Option<RoomId>;

    /// 参加中のルームを取得
    async fn room_of(&self, connection_id: &ConnectionId) -> Option<RoomId>;

    /// 送信元とターゲットが共に `room_id` の参加者であるか
    async fn signal_route(
        &self,
        from: &ConnectionId,
        room_id: &RoomId,
        target: &ConnectionId,
    ) -> bool;

    /// 要求者がオーナーで、ターゲットが同じルームにいる場合にそのルームを返す
    async fn kick_target(&self, requester: &ConnectionId, target: &ConnectionId)
    -> Option<RoomId>;

    /// ルームのスナップショットを取得
    async fn snapshot(&self, room_id: &RoomId) -> Option<RoomSnapshot>;

    /// 全ルームの一覧を取得
    async fn list_rooms(&self) -> Vec<RoomSummary>;

    /// 接続中の全ての接続 ID を取得（ルーム未参加を含む）
    async fn connection_ids(&self) -> Vec<ConnectionId>;
}
