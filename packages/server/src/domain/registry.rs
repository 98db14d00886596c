//! Connection Registry trait 定義
//!
//! ドメイン層が必要とする「接続中クライアントへの配信」のインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{ConnectionId, ConnectionInfo, PushError};

/// Outbound channel of one connection. Frames pushed here are written to the
/// socket in push order.
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Registry of live connections
///
/// Sends are best-effort: a connection that disconnected concurrently is
/// skipped, never an error for the caller of `broadcast`.
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// Register a connection and its outbound channel
    async fn register(&self, info: ConnectionInfo, sender: PusherChannel) -> ConnectionId;

    /// Remove a connection; no further frames are sent to it
    async fn unregister(&self, id: &ConnectionId);

    /// Record inbound activity on a connection
    async fn touch(&self, id: &ConnectionId, now_millis: i64);

    /// Send one event to every registered connection.
    ///
    /// Returns the number of connections the frame was handed to.
    async fn broadcast(&self, event: &str, data: &Value) -> Result<usize, PushError>;

    /// Send one event to exactly one connection
    async fn send_to(&self, id: &ConnectionId, event: &str, data: &Value) -> Result<(), PushError>;

    /// Snapshot of registered connections
    async fn connections(&self) -> Vec<ConnectionInfo>;

    async fn count(&self) -> usize;
}
