//! Wire protocol spoken over the WebSocket connection.
//!
//! Every frame is a JSON text frame shaped as `{"event": <name>, "data": <json>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event names used on the wire.
pub mod event {
    /// server → client: current signal reading (unicast on connect, broadcast on tick)
    pub const SIGNAL_UPDATE: &str = "signal_update";
    /// client → server: ask for a fresh reading (throttled per connection)
    pub const REQUEST_SIGNAL: &str = "request_signal";

    /// client → server: append an activity-log entry
    pub const ACTIVITY_CREATE: &str = "activity_create";
    /// server → client: broadcast of a stamped activity
    pub const ACTIVITY_UPDATE: &str = "activity_update";
    /// server → client (unicast): activity accepted
    pub const ACTIVITY_CREATE_CONFIRMED: &str = "activity_create_confirmed";

    /// client → server: push an incident update
    pub const INCIDENT_UPDATE: &str = "incident_update";
    /// server → client: broadcast of a stamped incident update
    pub const INCIDENT_BROADCAST: &str = "incident_broadcast";
    /// server → client (unicast): incident update accepted
    pub const INCIDENT_UPDATE_CONFIRMED: &str = "incident_update_confirmed";

    /// client → server: push an evacuation status update
    pub const EVACUATION_UPDATE: &str = "evacuation_update";
    /// server → client: broadcast of a stamped evacuation update
    pub const EVACUATION_BROADCAST: &str = "evacuation_broadcast";
    /// server → client (unicast): evacuation update accepted
    pub const EVACUATION_UPDATE_CONFIRMED: &str = "evacuation_update_confirmed";

    /// server → client (unicast), and local client-side failures
    pub const ERROR: &str = "error";
}

/// A single frame on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Event name (see [`event`])
    pub event: String,
    /// Event payload; `null` for events without one
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Envelope for an event that carries no payload
    pub fn bare(event: impl Into<String>) -> Self {
        Self::new(event, Value::Null)
    }

    /// Serialize into a text frame
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a text frame
    pub fn from_frame(frame: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(frame)
    }
}

/// Payload of the kind-specific `*_confirmed` unicast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationPayload {
    pub success: bool,
    pub message: String,
    pub data: Value,
}

/// Payload of the `error` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorPayload {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_without_data_defaults_to_null() {
        // テスト項目: data を省略したフレームは data = null として解釈される
        // given (前提条件):
        let frame = r#"{"event":"request_signal"}"#;

        // when (操作):
        let envelope = Envelope::from_frame(frame).unwrap();

        // then (期待する結果):
        assert_eq!(envelope.event, event::REQUEST_SIGNAL);
        assert_eq!(envelope.data, Value::Null);
    }

    #[test]
    fn test_envelope_frame_shape() {
        // テスト項目: Envelope は {"event", "data"} 形式でシリアライズされる
        // given (前提条件):
        let envelope = Envelope::new(event::INCIDENT_UPDATE, json!({"type": "Eruption"}));

        // when (操作):
        let frame: Value = serde_json::from_str(&envelope.to_frame().unwrap()).unwrap();

        // then (期待する結果):
        assert_eq!(
            frame,
            json!({"event": "incident_update", "data": {"type": "Eruption"}})
        );
    }

    #[test]
    fn test_error_payload_omits_missing_details() {
        // テスト項目: details が無い ErrorPayload は details キーを出力しない
        // given (前提条件):
        let payload = ErrorPayload::new("Malformed message");

        // when (操作):
        let value = serde_json::to_value(&payload).unwrap();

        // then (期待する結果):
        assert_eq!(value, json!({"message": "Malformed message"}));
    }

    #[test]
    fn test_frame_without_event_is_rejected() {
        // テスト項目: event キーを持たないフレームはパースに失敗する
        // given (前提条件):
        let frame = r#"{"data":{}}"#;

        // when (操作):
        let result = Envelope::from_frame(frame);

        // then (期待する結果):
        assert!(result.is_err());
    }
}
