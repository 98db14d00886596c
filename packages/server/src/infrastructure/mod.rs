//! Infrastructure layer: concrete implementations of the domain traits.

pub mod rate_limiter;
pub mod registry;
pub mod signal_generator;
pub mod store;

pub use rate_limiter::InMemoryRateLimiter;
pub use registry::WebSocketConnectionRegistry;
pub use signal_generator::RandomWalkSignalGenerator;
pub use store::InMemoryEventStore;
