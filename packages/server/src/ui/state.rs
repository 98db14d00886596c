//! Server state shared by all handlers.

use std::sync::Arc;

use siaga_shared::time::Clock;

use crate::{
    domain::ConnectionRegistry,
    infrastructure::InMemoryRateLimiter,
    usecase::{
        ConnectObserverUseCase, DisconnectObserverUseCase, GetRecentEventsUseCase,
        PublishEventUseCase, RefreshSignalUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// ConnectObserverUseCase（接続受付のユースケース）
    pub connect_observer_usecase: Arc<ConnectObserverUseCase>,
    /// DisconnectObserverUseCase（切断のユースケース）
    pub disconnect_observer_usecase: Arc<DisconnectObserverUseCase>,
    /// PublishEventUseCase（受信イベント配信のユースケース）
    pub publish_event_usecase: Arc<PublishEventUseCase>,
    /// RefreshSignalUseCase（シグナル配信のユースケース）
    pub refresh_signal_usecase: Arc<RefreshSignalUseCase>,
    /// GetRecentEventsUseCase（最近のイベント一覧取得のユースケース）
    pub get_recent_events_usecase: Arc<GetRecentEventsUseCase>,
    /// ConnectionRegistry（接続中クライアントの管理）
    pub registry: Arc<dyn ConnectionRegistry>,
    /// 呼び出し元ごとのリクエスト制限
    pub rate_limiter: Arc<InMemoryRateLimiter>,
    pub clock: Arc<dyn Clock>,
    /// Per-connection `request_signal` interval (milliseconds)
    pub signal_request_interval_ms: i64,
    pub admin_token: Option<String>,
}

impl AppState {
    /// Whether a connection presenting `token` may publish events
    pub fn can_publish(&self, token: Option<&str>) -> bool {
        match &self.admin_token {
            None => true,
            Some(expected) => token == Some(expected.as_str()),
        }
    }
}
