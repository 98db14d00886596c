//! Storage collaborator trait 定義
//!
//! スタンプ済みイベントの永続化先。ハブは追記と最新件数の取得だけを必要とします。

use async_trait::async_trait;

use super::{EventKind, StampedEvent, StoreError};

/// Append-only record of accepted events
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Record an event. Must either fully succeed or leave the store unchanged.
    async fn append(&self, event: &StampedEvent) -> Result<(), StoreError>;

    /// Most recent events of a kind, newest first
    async fn recent(&self, kind: EventKind, limit: usize) -> Result<Vec<StampedEvent>, StoreError>;
}
