//! UseCase: 受信イベントの検証・スタンプ・保存・配信
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - PublishEventUseCase::accept() / execute() メソッド
//!
//! ### なぜこのテストが必要か
//! - 必須フィールドが欠けたイベントは保存もブロードキャストもされないことを保証
//! - 保存に失敗したイベントがブロードキャストされないことを保証
//! - 成功時は全接続へのブロードキャストと送信元への確認が行われることを確認
//!
//! ### どのような状況を想定しているか
//! - 正常系：incident_update の受理とブロードキャスト
//! - 異常系：必須フィールド欠落、ストア障害、権限なし

use std::sync::Arc;

use serde_json::Value;
use siaga_shared::{
    protocol::{ConfirmationPayload, ErrorPayload, event},
    time::Clock,
};

use crate::domain::{
    ConnectionInfo, ConnectionRegistry, EventIdGenerator, EventKind, EventStore, InboundEvent,
    StampedEvent,
};

use super::error::PublishError;

/// 受信イベント配信のユースケース
pub struct PublishEventUseCase {
    /// EventStore（保存先の抽象化）
    store: Arc<dyn EventStore>,
    /// ConnectionRegistry（配信先の抽象化）
    registry: Arc<dyn ConnectionRegistry>,
    ids: EventIdGenerator,
    clock: Arc<dyn Clock>,
}

impl PublishEventUseCase {
    pub fn new(
        store: Arc<dyn EventStore>,
        registry: Arc<dyn ConnectionRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            registry,
            ids: EventIdGenerator::new(),
            clock,
        }
    }

    /// 検証・スタンプ・保存を行い、スタンプ済みイベントを返す
    ///
    /// 保存が完了するまで返らないので、戻り値をブロードキャストしても
    /// 対応する記録が無いことはない。
    pub async fn accept(&self, kind: EventKind, raw: Value) -> Result<StampedEvent, PublishError> {
        let inbound = InboundEvent::parse(kind, raw)?;
        let now = self.clock.now_millis();
        let stamped = inbound.stamp(self.ids.next(now), now);
        self.store.append(&stamped).await?;
        Ok(stamped)
    }

    /// 受信イベントを処理する
    ///
    /// 成功時はスタンプ済みイベントを全接続へブロードキャストし、送信元にだけ
    /// 確認を送る。失敗時は送信元にだけ `error` を送る。
    ///
    /// # Arguments
    ///
    /// * `origin` - イベントを送ってきた接続
    /// * `kind` - イベント種別
    /// * `raw` - 受信したペイロード
    pub async fn execute(
        &self,
        origin: &ConnectionInfo,
        kind: EventKind,
        raw: Value,
    ) -> Result<StampedEvent, PublishError> {
        if !origin.can_publish {
            tracing::warn!("Connection '{}' is not allowed to publish {}", origin.id, kind);
            self.report_error(origin, ErrorPayload::new(PublishError::Unauthorized.to_string()))
                .await;
            return Err(PublishError::Unauthorized);
        }

        let stamped = match self.accept(kind, raw).await {
            Ok(stamped) => stamped,
            Err(e) => {
                tracing::warn!("Rejected {} from '{}': {}", kind, origin.id, e);
                self.report_error(
                    origin,
                    ErrorPayload::with_details(kind.failure_message(), e.to_string()),
                )
                .await;
                return Err(e);
            }
        };

        let data = stamped.to_json();
        let delivered = self.registry.broadcast(kind.broadcast_event(), &data).await?;
        tracing::info!(
            "Broadcasted {} #{} to {} connection(s)",
            kind,
            stamped.id,
            delivered
        );

        let confirmation = ConfirmationPayload {
            success: true,
            message: kind.success_message().to_string(),
            data,
        };
        let confirmation = serde_json::to_value(&confirmation).unwrap_or(Value::Null);
        if let Err(e) = self
            .registry
            .send_to(&origin.id, kind.confirmation_event(), &confirmation)
            .await
        {
            tracing::debug!("Could not confirm {} to '{}': {}", kind, origin.id, e);
        }

        Ok(stamped)
    }

    async fn report_error(&self, origin: &ConnectionInfo, payload: ErrorPayload) {
        let data = serde_json::to_value(&payload).unwrap_or(Value::Null);
        if let Err(e) = self.registry.send_to(&origin.id, event::ERROR, &data).await {
            tracing::debug!("Could not report error to '{}': {}", origin.id, e);
        }
    }
}
