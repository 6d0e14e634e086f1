//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの送信チャンネル（`PusherChannel`）を管理
//! - `Notification` を JSON フレームに変換して送信（push_to, broadcast）
//! - 切断要求（close）を送信チャンネルに積む
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された送信チャンネルを受け取り、メッセージ送信に使用します。
//! チャンネルの受信側は接続ごとの送信タスクが 1 つだけ持つため、
//! 1 接続に対する送信順序は push した順序と一致します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{
        CloseReason, ConnectionId, MessagePushError, MessagePusher, Notification, Outbound,
        PusherChannel,
    },
    infrastructure::dto::websocket::ServerMessage,
};

/// WebSocket を使った MessagePusher 実装
///
/// ## 使用例
///
/// ```ignore
/// let pusher = WebSocketMessagePusher::new(Arc::new(Mutex::new(HashMap::new())));
/// pusher.register_client(connection_id, tx).await;
/// pusher.push_to(&connection_id, &Notification::Pong { ts: 0 }).await?;
/// ```
pub struct WebSocketMessagePusher {
    /// 接続中のクライアントの送信チャンネル
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl Default for WebSocketMessagePusher {
    fn default() -> Self {
        Self::new(Arc::new(Mutex::new(HashMap::new())))
    }
}

impl WebSocketMessagePusher {
    /// 新しい WebSocketMessagePusher を作成
    pub fn new(clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>) -> Self {
        Self { clients }
    }

    fn encode(notification: &Notification) -> Result<String, MessagePushError> {
        let message = ServerMessage::from(notification.clone());
        serde_json::to_string(&message).map_err(|e| MessagePushError::EncodeFailed(e.to_string()))
    }

    fn send(
        clients: &HashMap<ConnectionId, PusherChannel>,
        connection_id: &ConnectionId,
        outbound: Outbound,
    ) -> Result<(), MessagePushError> {
        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        sender
            .send(outbound)
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, channel: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, channel);
        tracing::debug!("Connection {} registered to MessagePusher", connection_id);
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!("Connection {} unregistered from MessagePusher", connection_id);
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        let frame = Self::encode(notification)?;
        let clients = self.clients.lock().await;
        Self::send(&clients, connection_id, Outbound::Frame(frame))?;
        tracing::debug!("Pushed message to connection {}", connection_id);
        Ok(())
    }

    async fn broadcast(
        &self,
        targets: Vec<ConnectionId>,
        notification: &Notification,
    ) -> Result<(), MessagePushError> {
        // 全宛先で同じフレームを使うため、エンコードは 1 回だけ
        let frame = Self::encode(notification)?;
        let clients = self.clients.lock().await;

        for target in targets {
            // ブロードキャストでは一部の送信失敗を許容
            match Self::send(&clients, &target, Outbound::Frame(frame.clone())) {
                Ok(()) => tracing::debug!("Broadcasted message to connection {}", target),
                Err(e) => tracing::debug!("Skipping connection {} during broadcast: {}", target, e),
            }
        }

        Ok(())
    }

    async fn close(
        &self,
        connection_id: &ConnectionId,
        reason: CloseReason,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;
        Self::send(&clients, connection_id, Outbound::Close(reason))?;
        tracing::debug!("Requested close of connection {} ({})", connection_id, reason);
        Ok(())
    }
}
