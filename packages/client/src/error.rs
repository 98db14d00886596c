//! Error types for the observer client.

use thiserror::Error;

/// Client-specific errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// Handshake or transport failure
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The hub URL could not be parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A stdin line could not be turned into an event
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}
