//! UseCase: シグナル値の更新と配信

use std::sync::Arc;

use serde_json::Value;
use siaga_shared::{protocol::event, signal::SignalState};

use crate::domain::{ConnectionId, ConnectionRegistry, PushError, SignalSource};

/// How an honored `request_signal` was answered
#[derive(Debug, Clone, PartialEq)]
pub enum SignalDelivery {
    /// The generator advanced and the new reading went to every connection
    Broadcast(SignalState),
    /// The generator gate was closed; the requester got the current reading
    Unicast(SignalState),
}

/// シグナル配信のユースケース
pub struct RefreshSignalUseCase {
    source: Arc<dyn SignalSource>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl RefreshSignalUseCase {
    pub fn new(source: Arc<dyn SignalSource>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self { source, registry }
    }

    /// Advance the generator and broadcast the new reading, if it advanced
    pub async fn tick_and_broadcast(&self) -> Result<Option<SignalState>, PushError> {
        let Some(next) = self.source.tick() else {
            return Ok(None);
        };
        self.registry
            .broadcast(event::SIGNAL_UPDATE, &to_value(&next))
            .await?;
        Ok(Some(next))
    }

    /// Answer a `request_signal` the per-connection throttle let through
    pub async fn request(&self, requester: &ConnectionId) -> Result<SignalDelivery, PushError> {
        if let Some(next) = self.tick_and_broadcast().await? {
            return Ok(SignalDelivery::Broadcast(next));
        }
        let current = self.source.current();
        self.registry
            .send_to(requester, event::SIGNAL_UPDATE, &to_value(&current))
            .await?;
        Ok(SignalDelivery::Unicast(current))
    }
}

fn to_value(state: &SignalState) -> Value {
    serde_json::to_value(state).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::ConnectionInfo,
        infrastructure::{RandomWalkSignalGenerator, WebSocketConnectionRegistry},
    };
    use siaga_shared::time::ManualClock;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        usecase: RefreshSignalUseCase,
        registry: Arc<WebSocketConnectionRegistry>,
        clock: Arc<ManualClock>,
    }

    fn create_fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(0));
        let registry = Arc::new(WebSocketConnectionRegistry::new());
        let source = Arc::new(RandomWalkSignalGenerator::new(
            SignalState::default(),
            Duration::from_millis(1_000),
            clock.clone(),
        ));
        Fixture {
            usecase: RefreshSignalUseCase::new(source, registry.clone()),
            registry,
            clock,
        }
    }

    async fn connect(
        registry: &WebSocketConnectionRegistry,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry
            .register(ConnectionInfo::new("127.0.0.1", 0, true), tx)
            .await;
        (id, rx)
    }

    #[tokio::test]
    async fn test_request_broadcasts_when_generator_advances() {
        // テスト項目: ジェネレータが進んだ場合は新しい値が全接続にブロードキャストされる
        // given (前提条件):
        let fixture = create_fixture();
        let (alice, mut alice_rx) = connect(&fixture.registry).await;
        let (_bob, mut bob_rx) = connect(&fixture.registry).await;
        fixture.clock.advance(1_000);

        // when (操作):
        let delivery = fixture.usecase.request(&alice).await.unwrap();

        // then (期待する結果):
        assert!(matches!(delivery, SignalDelivery::Broadcast(_)));
        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_request_unicasts_current_when_gate_closed() {
        // テスト項目: ジェネレータの間隔が未経過の場合は現在値が要求元にだけ送られる
        // given (前提条件):
        let fixture = create_fixture();
        let (alice, mut alice_rx) = connect(&fixture.registry).await;
        let (_bob, mut bob_rx) = connect(&fixture.registry).await;

        // when (操作):
        let delivery = fixture.usecase.request(&alice).await.unwrap();

        // then (期待する結果):
        assert_eq!(delivery, SignalDelivery::Unicast(SignalState::default()));
        assert!(alice_rx.try_recv().is_ok());
        assert!(bob_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tick_and_broadcast_noop_inside_interval() {
        // テスト項目: 最小間隔内の tick_and_broadcast は何も送らない
        // given (前提条件):
        let fixture = create_fixture();
        let (_alice, mut alice_rx) = connect(&fixture.registry).await;
        fixture.clock.advance(500);

        // when (操作):
        let result = fixture.usecase.tick_and_broadcast().await.unwrap();

        // then (期待する結果):
        assert_eq!(result, None);
        assert!(alice_rx.try_recv().is_err());
    }
}
