//! Event formatting for the terminal.

use chrono::DateTime;
use serde_json::Value;
use siaga_shared::protocol::{Envelope, event};

/// Event formatter for client display
pub struct EventFormatter;

impl EventFormatter {
    /// Format any inbound event, falling back to its raw JSON
    pub fn format_envelope(envelope: &Envelope) -> String {
        let data = &envelope.data;
        match envelope.event.as_str() {
            event::SIGNAL_UPDATE => Self::format_signal(data),
            event::ACTIVITY_UPDATE => format!(
                "\n* {} {}\n",
                Self::format_time(data),
                text(data, "message")
            ),
            event::INCIDENT_BROADCAST => format!(
                "\n\n------------------------------------------------------------\n\
                 ! INCIDENT #{}: {} at {}\n\
                 reported at {}\n\
                 ------------------------------------------------------------\n",
                data["id"],
                text(data, "type"),
                text(data, "location"),
                Self::format_time(data)
            ),
            event::EVACUATION_BROADCAST => format!(
                "\n> Evacuation #{}: {} is {} ({})\n",
                data["id"],
                text(data, "location"),
                text(data, "status"),
                Self::format_time(data)
            ),
            event::ACTIVITY_CREATE_CONFIRMED
            | event::INCIDENT_UPDATE_CONFIRMED
            | event::EVACUATION_UPDATE_CONFIRMED => {
                format!("ok: {}\n", text(data, "message"))
            }
            event::ERROR => match data.get("details").and_then(Value::as_str) {
                Some(details) => format!("\nerror: {} ({})\n", text(data, "message"), details),
                None => format!("\nerror: {}\n", text(data, "message")),
            },
            other => format!("\n[{}] {}\n", other, data),
        }
    }

    /// Format a weather reading
    pub fn format_signal(data: &Value) -> String {
        format!(
            "\n~ {:.1}°C, wind {:.1} km/h {}, humidity {:.1}%\n",
            data["temperature"].as_f64().unwrap_or_default(),
            data["windSpeed"].as_f64().unwrap_or_default(),
            text(data, "windDirection"),
            data["humidity"].as_f64().unwrap_or_default()
        )
    }

    /// `HH:MM:SS` of the event's RFC 3339 `timestamp`, or the raw value if it does not parse
    pub fn format_time(data: &Value) -> String {
        let raw = text(data, "timestamp");
        DateTime::parse_from_rfc3339(raw)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|_| raw.to_string())
    }
}

fn text<'a>(data: &'a Value, field: &str) -> &'a str {
    data.get(field).and_then(Value::as_str).unwrap_or("?")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_incident_broadcast() {
        // テスト項目: incident_broadcast が id・種別・場所・時刻付きで整形される
        // given (前提条件):
        let envelope = Envelope::new(
            "incident_broadcast",
            json!({
                "id": 42,
                "type": "Eruption",
                "location": "Sector A",
                "timestamp": "2024-05-01T08:15:30.000Z"
            }),
        );

        // when (操作):
        let result = EventFormatter::format_envelope(&envelope);

        // then (期待する結果):
        assert!(result.contains("! INCIDENT #42: Eruption at Sector A"));
        assert!(result.contains("reported at 08:15:30"));
    }

    #[test]
    fn test_format_signal_update() {
        // テスト項目: signal_update が小数 1 桁で整形される
        // given (前提条件):
        let envelope = Envelope::new(
            "signal_update",
            json!({"temperature": 27.04, "windSpeed": 12.0, "humidity": 75.0, "windDirection": "Tenggara"}),
        );

        // when (操作):
        let result = EventFormatter::format_envelope(&envelope);

        // then (期待する結果):
        assert_eq!(result, "\n~ 27.0°C, wind 12.0 km/h Tenggara, humidity 75.0%\n");
    }

    #[test]
    fn test_format_error_with_details() {
        // テスト項目: error は details があれば併記される
        // given (前提条件):
        let envelope = Envelope::new(
            "error",
            json!({"message": "Failed to save activity", "details": "missing field message"}),
        );

        // when (操作):
        let result = EventFormatter::format_envelope(&envelope);

        // then (期待する結果):
        assert_eq!(result, "\nerror: Failed to save activity (missing field message)\n");
    }

    #[test]
    fn test_format_time_keeps_unparseable_value() {
        // テスト項目: RFC 3339 として解釈できない timestamp はそのまま表示される
        // given (前提条件):
        let data = json!({"timestamp": "yesterday"});

        // when (操作):
        let result = EventFormatter::format_time(&data);

        // then (期待する結果):
        assert_eq!(result, "yesterday");
    }

    #[test]
    fn test_format_unknown_event_as_raw_json() {
        // テスト項目: 未知のイベントは名前と生 JSON で表示される
        // given (前提条件):
        let envelope = Envelope::new("custom", json!({"a": 1}));

        // when (操作):
        let result = EventFormatter::format_envelope(&envelope);

        // then (期待する結果):
        assert_eq!(result, "\n[custom] {\"a\":1}\n");
    }
}
