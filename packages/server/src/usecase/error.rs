//! UseCase errors.

use thiserror::Error;

use crate::domain::{PushError, StoreError, ValidationError};

/// Why an inbound event was not broadcast
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("Not authorized to publish events")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Push(#[from] PushError),
}
