//! Server configuration.

use std::time::Duration;

use crate::domain::RateLimitPolicy;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];

/// Everything the hub needs to know at start-up
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port number to bind to
    pub port: u16,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Production mode adds `Strict-Transport-Security`
    pub production: bool,
    /// Keyed limiter applied to every HTTP request (including the WebSocket handshake)
    pub rate_limit: RateLimitPolicy,
    /// Minimum interval between two generator ticks
    pub signal_min_interval: Duration,
    /// Minimum interval between two honored `request_signal` from one connection
    pub signal_request_interval: Duration,
    /// Period of the server-driven signal broadcast; `None` disables it
    pub signal_broadcast_period: Option<Duration>,
    /// Events kept per kind by the in-memory store
    pub store_capacity: usize,
    /// When set, only connections presenting this token may publish
    pub admin_token: Option<String>,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            production: false,
            rate_limit: RateLimitPolicy::default(),
            signal_min_interval: Duration::from_millis(1_000),
            signal_request_interval: Duration::from_millis(1_000),
            signal_broadcast_period: Some(Duration::from_millis(5_000)),
            store_capacity: 1_000,
            admin_token: None,
        }
    }
}
