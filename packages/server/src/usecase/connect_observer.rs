//! UseCase: 接続受付処理
//!
//! ハンドシェイク受付時に接続をレジストリへ登録し、Open になった接続にだけ
//! 現在のシグナル値を送る（初期同期）。他の接続へはブロードキャストしない。

use std::sync::Arc;

use serde_json::Value;
use siaga_shared::{protocol::event, time::Clock};

use crate::domain::{
    ConnectionId, ConnectionInfo, ConnectionRegistry, PushError, PusherChannel, SignalSource,
};

/// 接続受付のユースケース
pub struct ConnectObserverUseCase {
    registry: Arc<dyn ConnectionRegistry>,
    signal_source: Arc<dyn SignalSource>,
    clock: Arc<dyn Clock>,
}

impl ConnectObserverUseCase {
    pub fn new(
        registry: Arc<dyn ConnectionRegistry>,
        signal_source: Arc<dyn SignalSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            signal_source,
            clock,
        }
    }

    /// 接続を登録する
    ///
    /// # Arguments
    ///
    /// * `remote` - 接続元の識別子（IP アドレス）
    /// * `can_publish` - この接続がイベントを push できるか
    /// * `sender` - この接続へのフレーム送信用チャンネル
    pub async fn execute(
        &self,
        remote: String,
        can_publish: bool,
        sender: PusherChannel,
    ) -> ConnectionInfo {
        let info = ConnectionInfo::new(remote, self.clock.now_millis(), can_publish);
        self.registry.register(info.clone(), sender).await;
        info
    }

    /// 現在のシグナル値をこの接続にだけ送る
    pub async fn initial_sync(&self, id: &ConnectionId) -> Result<(), PushError> {
        let current = self.signal_source.current();
        let data = serde_json::to_value(&current).unwrap_or(Value::Null);
        self.registry.send_to(id, event::SIGNAL_UPDATE, &data).await
    }
}
