//! MessagePusher trait 定義
//!
//! 接続中のクライアントへ通知を届けるためのインターフェース。
//! 具体的な実装（WebSocket）は Infrastructure 層が提供します。

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::{ConnectionId, MessagePushError, Notification};

pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
pub const CLOSE_MESSAGE_TOO_BIG: u16 = 1009;

/// Why the server closes a connection. The display text is the close-frame reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CloseReason {
    #[error("Message too big")]
    MessageTooBig,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Origin not allowed")]
    OriginNotAllowed,

    #[error("Kicked by room owner")]
    Kicked,

    #[error("Replaced by a newer session")]
    Replaced,
}

impl CloseReason {
    pub fn code(&self) -> u16 {
        match self {
            Self::MessageTooBig => CLOSE_MESSAGE_TOO_BIG,
            Self::RateLimited | Self::OriginNotAllowed => CLOSE_POLICY_VIOLATION,
            Self::Kicked | Self::Replaced => CLOSE_NORMAL,
        }
    }

    /// Text of the `error` frame sent before closing for protocol abuse.
    pub fn client_message(&self) -> Option<&'static str> {
        match self {
            Self::MessageTooBig => Some("Message too large. Connection closed by server."),
            Self::RateLimited => Some("Too many messages. Connection closed by server."),
            _ => None,
        }
    }
}

/// Item queued on a connection's outbound channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Serialized JSON frame.
    Frame(String),
    /// Send a close frame and stop writing.
    Close(CloseReason),
}

/// Outbound channel of one connection
pub type PusherChannel = mpsc::UnboundedSender<Outbound>;

/// MessagePusher trait
///
/// 1 接続への送信は登録されたチャンネルを経由するため、接続ごとの FIFO が保たれる。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// クライアントの送信チャンネルを登録
    async fn register_client(&self, connection_id: ConnectionId, channel: PusherChannel);

    /// クライアントの送信チャンネルを登録解除
    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// 特定のクライアントに通知を送信
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// 複数のクライアントに同じ通知を送信（一部の失敗は許容）
    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError>;

    /// クライアントの接続を閉じる（キュー済みの通知の後に close される）
    async fn close(
        &self,
        connection_id: &ConnectionId,
        reason: CloseReason,
    ) -> Result<(), MessagePushError>;
}
