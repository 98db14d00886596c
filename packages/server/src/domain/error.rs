//! Domain errors.

use thiserror::Error;

use super::event::EventKind;

/// An inbound event is missing something its kind requires
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{kind} payload must be a JSON object")]
    NotAnObject { kind: EventKind },

    #[error("{kind} requires a non-empty '{field}' field")]
    MissingField {
        kind: EventKind,
        field: &'static str,
    },
}

/// The storage collaborator could not record an event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A frame could not be handed to a connection
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    #[error("Connection '{0}' not found")]
    ConnectionNotFound(String),

    #[error("Push failed: {0}")]
    PushFailed(String),

    #[error("Encode failed: {0}")]
    EncodeFailed(String),
}
