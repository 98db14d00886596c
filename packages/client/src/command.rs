//! Parsing of stdin lines into outbound events.

use serde_json::{Value, json};
use siaga_shared::protocol::event;

use crate::error::ClientError;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `/signal`
    RequestSignal,
    /// `/activity <message>`
    Activity(String),
    /// `<event_name> [json]`
    Emit { event: String, data: Value },
    /// `/quit`
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, ClientError> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        match head {
            "" => Err(ClientError::InvalidCommand("empty line".to_string())),
            "/quit" => Ok(Self::Quit),
            "/signal" => Ok(Self::RequestSignal),
            "/activity" if rest.is_empty() => Err(ClientError::InvalidCommand(
                "usage: /activity <message>".to_string(),
            )),
            "/activity" => Ok(Self::Activity(rest.to_string())),
            other if other.starts_with('/') => {
                Err(ClientError::InvalidCommand(format!("unknown command {}", other)))
            }
            name => {
                let data = if rest.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(rest)
                        .map_err(|e| ClientError::InvalidCommand(format!("invalid JSON: {}", e)))?
                };
                Ok(Self::Emit {
                    event: name.to_string(),
                    data,
                })
            }
        }
    }

    /// Event name and payload to emit, `None` for [`Command::Quit`]
    pub fn into_event(self) -> Option<(String, Value)> {
        match self {
            Self::RequestSignal => Some((event::REQUEST_SIGNAL.to_string(), Value::Null)),
            Self::Activity(message) => Some((
                event::ACTIVITY_CREATE.to_string(),
                json!({ "message": message }),
            )),
            Self::Emit { event, data } => Some((event, data)),
            Self::Quit => None,
        }
    }
}
