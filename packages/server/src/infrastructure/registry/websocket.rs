//! WebSocket を使った ConnectionRegistry 実装
//!
//! ## 責務
//!
//! - 接続ごとの `UnboundedSender` と接続情報を管理
//! - クライアントへのイベント送信（send_to, broadcast）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、フレームの送信に使用します。
//! 送信は非ブロッキングなので、遅い接続がブロードキャスト全体を止めることはありません。

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use siaga_shared::protocol::Envelope;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionInfo, ConnectionRegistry, PushError, PusherChannel};

struct ConnectionEntry {
    info: ConnectionInfo,
    sender: PusherChannel,
}

/// WebSocket を使った ConnectionRegistry 実装
#[derive(Default)]
pub struct WebSocketConnectionRegistry {
    /// Key: ConnectionId, Value: 接続情報と送信チャンネル
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl WebSocketConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

fn encode(event: &str, data: &Value) -> Result<String, PushError> {
    Envelope::new(event, data.clone())
        .to_frame()
        .map_err(|e| PushError::EncodeFailed(e.to_string()))
}

#[async_trait]
impl ConnectionRegistry for WebSocketConnectionRegistry {
    async fn register(&self, info: ConnectionInfo, sender: PusherChannel) -> ConnectionId {
        let id = info.id;
        let mut connections = self.connections.lock().await;
        connections.insert(id, ConnectionEntry { info, sender });
        tracing::debug!("Connection '{}' registered ({} live)", id, connections.len());
        id
    }

    async fn unregister(&self, id: &ConnectionId) {
        let mut connections = self.connections.lock().await;
        if connections.remove(id).is_some() {
            tracing::debug!("Connection '{}' unregistered ({} live)", id, connections.len());
        }
    }

    async fn touch(&self, id: &ConnectionId, now_millis: i64) {
        let mut connections = self.connections.lock().await;
        if let Some(entry) = connections.get_mut(id) {
            entry.info.last_activity = now_millis;
        }
    }

    async fn broadcast(&self, event: &str, data: &Value) -> Result<usize, PushError> {
        let frame = encode(event, data)?;
        let connections = self.connections.lock().await;

        let mut delivered = 0;
        for (id, entry) in connections.iter() {
            // 切断済みの接続への送信失敗は許容
            if let Err(e) = entry.sender.send(frame.clone()) {
                tracing::warn!("Failed to push '{}' to connection '{}': {}", event, id, e);
            } else {
                delivered += 1;
            }
        }
        tracing::debug!("Broadcasted '{}' to {} connection(s)", event, delivered);

        Ok(delivered)
    }

    async fn send_to(&self, id: &ConnectionId, event: &str, data: &Value) -> Result<(), PushError> {
        let frame = encode(event, data)?;
        let connections = self.connections.lock().await;

        let entry = connections
            .get(id)
            .ok_or_else(|| PushError::ConnectionNotFound(id.to_string()))?;
        entry
            .sender
            .send(frame)
            .map_err(|e| PushError::PushFailed(e.to_string()))?;
        tracing::debug!("Pushed '{}' to connection '{}'", event, id);

        Ok(())
    }

    async fn connections(&self) -> Vec<ConnectionInfo> {
        let connections = self.connections.lock().await;
        connections.values().map(|entry| entry.info.clone()).collect()
    }

    async fn count(&self) -> usize {
        self.connections.lock().await.len()
    }
}
