//! Siaga observer client.
//!
//! Keeps one WebSocket connection to the event hub alive with exponential
//! backoff, fans inbound events out to local listeners and emits outbound
//! events while connected.

pub mod backoff;
pub mod command;
pub mod error;
pub mod formatter;
pub mod listener;
pub mod manager;
pub mod transport;

pub use error::ClientError;
pub use listener::{ListenerRegistry, Subscription};
pub use manager::{ConnectionManager, ConnectionPhase, ManagerConfig};
pub use transport::{Connector, Transport, WebSocketConnector, hub_url};
