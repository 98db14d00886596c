//! InMemory EventStore 実装
//!
//! ドメイン層が定義する EventStore trait の具体的な実装。
//! 種別ごとのリングバッファをインメモリ DB として使用します。
//! 容量に達した種別は最も古い記録から捨てます。

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{EventKind, EventStore, StampedEvent, StoreError};

/// Default number of events kept per kind
pub const DEFAULT_CAPACITY: usize = 1000;

/// インメモリ EventStore 実装
pub struct InMemoryEventStore {
    events: Mutex<HashMap<EventKind, VecDeque<StampedEvent>>>,
    /// 種別ごとの最大保持件数
    capacity: usize,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(HashMap::new()),
            capacity,
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(&self, event: &StampedEvent) -> Result<(), StoreError> {
        let mut events = self.events.lock().await;
        let records = events.entry(event.kind).or_default();
        records.push_back(event.clone());
        while records.len() > self.capacity {
            records.pop_front();
        }
        Ok(())
    }

    async fn recent(&self, kind: EventKind, limit: usize) -> Result<Vec<StampedEvent>, StoreError> {
        let events = self.events.lock().await;
        let mut recent: Vec<StampedEvent> = events
            .get(&kind)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        recent.truncate(limit);
        Ok(recent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::InboundEvent;
    use serde_json::json;

    fn activity(id: i64, now_millis: i64) -> StampedEvent {
        InboundEvent::parse(EventKind::ActivityCreate, json!({"message": format!("m{id}")}))
            .unwrap()
            .stamp(id, now_millis)
    }

    #[tokio::test]
    async fn test_recent_returns_newest_first() {
        // テスト項目: recent は新しい順に上限件数まで返す
        // given (前提条件):
        let store = InMemoryEventStore::new();
        for i in 1..=4 {
            store.append(&activity(i, i * 1_000)).await.unwrap();
        }

        // when (操作):
        let recent = store.recent(EventKind::ActivityCreate, 2).await.unwrap();

        // then (期待する結果):
        let ids: Vec<i64> = recent.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_kinds_are_stored_separately() {
        // テスト項目: 種別ごとに独立して保存される
        // given (前提条件):
        let store = InMemoryEventStore::new();
        store.append(&activity(1, 0)).await.unwrap();

        // when (操作):
        let incidents = store.recent(EventKind::IncidentUpdate, 10).await.unwrap();

        // then (期待する結果):
        assert!(incidents.is_empty());
    }

    #[tokio::test]
    async fn test_append_evicts_oldest_when_full() {
        // テスト項目: 容量を超えても append は成功し、最も古い記録から捨てられる
        // given (前提条件):
        let store = InMemoryEventStore::with_capacity(3);

        // when (操作):
        let mut results = Vec::new();
        for i in 1..=7 {
            results.push(store.append(&activity(i, i * 1_000)).await);
        }

        // then (期待する結果):
        assert!(results.iter().all(|r| r.is_ok()));
        let recent = store.recent(EventKind::ActivityCreate, 10).await.unwrap();
        let ids: Vec<i64> = recent.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![7, 6, 5]);
    }

    #[tokio::test]
    async fn test_eviction_is_per_kind() {
        // テスト項目: ある種別の容量超過は他の種別の記録を捨てない
        // given (前提条件):
        let store = InMemoryEventStore::with_capacity(1);
        let incident = InboundEvent::parse(
            EventKind::IncidentUpdate,
            json!({"type": "flood", "location": "Kampung Melayu"}),
        )
        .unwrap()
        .stamp(100, 0);
        store.append(&incident).await.unwrap();

        // when (操作):
        store.append(&activity(1, 1)).await.unwrap();
        store.append(&activity(2, 2)).await.unwrap();

        // then (期待する結果):
        let incidents = store.recent(EventKind::IncidentUpdate, 10).await.unwrap();
        assert_eq!(incidents.len(), 1);
        let activities = store.recent(EventKind::ActivityCreate, 10).await.unwrap();
        assert_eq!(activities.iter().map(|e| e.id).collect::<Vec<_>>(), vec![2]);
    }
}
