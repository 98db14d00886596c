//! UseCase: 切断処理

use std::sync::Arc;

use crate::domain::{ConnectionId, ConnectionRegistry};

/// 切断のユースケース
pub struct DisconnectObserverUseCase {
    registry: Arc<dyn ConnectionRegistry>,
}

impl DisconnectObserverUseCase {
    pub fn new(registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { registry }
    }

    /// 接続をレジストリから取り除く。以降この接続への送信は行われない。
    pub async fn execute(&self, id: &ConnectionId) {
        self.registry.unregister(id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::ConnectionInfo, infrastructure::WebSocketConnectionRegistry};
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_disconnect_removes_connection() {
        // テスト項目: 切断した接続はレジストリから削除される
        // given (前提条件):
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = registry
            .register(ConnectionInfo::new("127.0.0.1", 0, true), tx)
            .await;
        let usecase = DisconnectObserverUseCase::new(registry.clone());

        // when (操作):
        usecase.execute(&id).await;

        // then (期待する結果):
        assert_eq!(registry.count().await, 0);
    }

    #[tokio::test]
    async fn test_disconnect_twice_is_harmless() {
        // テスト項目: 同じ接続を二度切断してもエラーにならない
        // given (前提条件):
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let id = ConnectionInfo::new("127.0.0.1", 0, true).id;
        let usecase = DisconnectObserverUseCase::new(registry.clone());

        // when (操作):
        usecase.execute(&id).await;
        usecase.execute(&id).await;

        // then (期待する結果):
        assert_eq!(registry.count().await, 0);
    }
}
