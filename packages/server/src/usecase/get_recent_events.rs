//! UseCase: 最近のイベント一覧取得

use std::sync::Arc;

use crate::domain::{EventKind, EventStore, StampedEvent, StoreError};

/// Default page size of the recent-events listing
pub const DEFAULT_LIMIT: usize = 5;
/// Upper bound on the page size a caller may ask for
pub const MAX_LIMIT: usize = 100;

/// 最近のイベント一覧取得のユースケース
pub struct GetRecentEventsUseCase {
    store: Arc<dyn EventStore>,
}

impl GetRecentEventsUseCase {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// 指定種別の最新イベントを新しい順に返す
    pub async fn execute(
        &self,
        kind: EventKind,
        limit: Option<usize>,
    ) -> Result<Vec<StampedEvent>, StoreError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        self.store.recent(kind, limit).await
    }
}
