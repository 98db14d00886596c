//! UseCase layer: the hub's operations, composed from domain traits.

mod connect_observer;
mod disconnect_observer;
mod error;
mod get_recent_events;
mod publish_event;
mod refresh_signal;

pub use connect_observer::ConnectObserverUseCase;
pub use disconnect_observer::DisconnectObserverUseCase;
pub use error::PublishError;
pub use get_recent_events::GetRecentEventsUseCase;
pub use publish_event::PublishEventUseCase;
pub use refresh_signal::{RefreshSignalUseCase, SignalDelivery};
