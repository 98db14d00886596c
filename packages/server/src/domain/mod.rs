//! Domain layer: value objects, pure policies and the traits the hub depends on.

pub mod connection;
pub mod error;
pub mod event;
pub mod rate_limit;
pub mod registry;
pub mod signal;
pub mod store;
pub mod throttle;

pub use connection::{ConnectionId, ConnectionInfo};
pub use error::{PushError, StoreError, ValidationError};
pub use event::{EventIdGenerator, EventKind, InboundEvent, StampedEvent};
pub use rate_limit::{RateLimitEntry, RateLimitPolicy};
pub use registry::{ConnectionRegistry, PusherChannel};
pub use signal::SignalSource;
pub use store::EventStore;
pub use throttle::IntervalThrottle;

#[cfg(test)]
pub use store::MockEventStore;
