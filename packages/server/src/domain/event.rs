//! Inbound events, their validation and stamping.

use std::{
    fmt,
    sync::atomic::{AtomicI64, Ordering},
};

use serde_json::{Map, Value};
use siaga_shared::{protocol::event, time::timestamp_to_rfc3339};

use super::error::ValidationError;

/// Kinds of event an observer may push back to the hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ActivityCreate,
    IncidentUpdate,
    EvacuationUpdate,
}

impl EventKind {
    /// Resolve an inbound wire event name
    pub fn from_inbound(name: &str) -> Option<Self> {
        match name {
            event::ACTIVITY_CREATE => Some(Self::ActivityCreate),
            event::INCIDENT_UPDATE => Some(Self::IncidentUpdate),
            event::EVACUATION_UPDATE => Some(Self::EvacuationUpdate),
            _ => None,
        }
    }

    /// Wire name of the inbound event
    pub fn inbound_event(self) -> &'static str {
        match self {
            Self::ActivityCreate => event::ACTIVITY_CREATE,
            Self::IncidentUpdate => event::INCIDENT_UPDATE,
            Self::EvacuationUpdate => event::EVACUATION_UPDATE,
        }
    }

    /// Wire name under which the stamped event is broadcast
    pub fn broadcast_event(self) -> &'static str {
        match self {
            Self::ActivityCreate => event::ACTIVITY_UPDATE,
            Self::IncidentUpdate => event::INCIDENT_BROADCAST,
            Self::EvacuationUpdate => event::EVACUATION_BROADCAST,
        }
    }

    /// Wire name of the unicast confirmation sent to the originator
    pub fn confirmation_event(self) -> &'static str {
        match self {
            Self::ActivityCreate => event::ACTIVITY_CREATE_CONFIRMED,
            Self::IncidentUpdate => event::INCIDENT_UPDATE_CONFIRMED,
            Self::EvacuationUpdate => event::EVACUATION_UPDATE_CONFIRMED,
        }
    }

    pub fn required_fields(self) -> &'static [&'static str] {
        match self {
            Self::ActivityCreate => &["message"],
            Self::IncidentUpdate => &["type", "location"],
            Self::EvacuationUpdate => &["location", "status"],
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::ActivityCreate => "Activity successfully recorded",
            Self::IncidentUpdate => "Incident update successfully processed",
            Self::EvacuationUpdate => "Evacuation update successfully processed",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            Self::ActivityCreate => "Failed to save activity",
            Self::IncidentUpdate => "Failed to process incident update",
            Self::EvacuationUpdate => "Failed to process evacuation update",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.inbound_event())
    }
}

/// A validated, not yet stamped inbound event
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    kind: EventKind,
    payload: Map<String, Value>,
}

impl InboundEvent {
    /// Validate a raw payload against the required fields of `kind`.
    ///
    /// Required fields must be non-blank strings.
    pub fn parse(kind: EventKind, raw: Value) -> Result<Self, ValidationError> {
        let Value::Object(payload) = raw else {
            return Err(ValidationError::NotAnObject { kind });
        };

        for &field in kind.required_fields() {
            let present = matches!(payload.get(field), Some(Value::String(s)) if !s.trim().is_empty());
            if !present {
                return Err(ValidationError::MissingField { kind, field });
            }
        }

        Ok(Self { kind, payload })
    }

    /// Attach id and timestamp. The caller's own non-empty `timestamp`
    /// string is kept; otherwise `now_millis` is used.
    pub fn stamp(self, id: i64, now_millis: i64) -> StampedEvent {
        let timestamp = match self.payload.get("timestamp") {
            Some(Value::String(ts)) if !ts.trim().is_empty() => ts.clone(),
            _ => timestamp_to_rfc3339(now_millis),
        };
        StampedEvent {
            id,
            timestamp,
            kind: self.kind,
            payload: self.payload,
        }
    }
}

/// An inbound event after stamping; immutable from here on
#[derive(Debug, Clone, PartialEq)]
pub struct StampedEvent {
    pub id: i64,
    /// RFC 3339
    pub timestamp: String,
    pub kind: EventKind,
    payload: Map<String, Value>,
}

impl StampedEvent {
    /// Wire representation: the free-form payload with `id` and `timestamp`
    pub fn to_json(&self) -> Value {
        let mut object = self.payload.clone();
        object.insert("timestamp".to_string(), Value::String(self.timestamp.clone()));
        object.insert("id".to_string(), Value::from(self.id));
        Value::Object(object)
    }
}

/// Hands out process-unique, strictly increasing event ids.
///
/// Ids track wall-clock milliseconds while events are sparse and fall back to
/// `last + 1` when several arrive within the same millisecond.
#[derive(Debug, Default)]
pub struct EventIdGenerator {
    last: AtomicI64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now_millis: i64) -> i64 {
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now_millis.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now_millis.max(previous + 1)
    }
}
