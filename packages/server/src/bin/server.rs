//! Siaga real-time event hub.
//!
//! Accepts WebSocket observers, validates the events they push and fans them out
//! to every live connection, alongside a periodic weather signal.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin siaga-server
//! cargo run --bin siaga-server -- --host 0.0.0.0 --port 3001
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use siaga_server::{
    config::ServerConfig, domain::RateLimitPolicy, infrastructure::InMemoryEventStore, ui::Server,
};
use siaga_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "siaga-server")]
#[command(about = "Real-time event hub with WebSocket broadcast", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "SIAGA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "3001")]
    port: u16,

    /// Comma separated list of origins allowed by CORS
    #[arg(
        long,
        env = "SIAGA_ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:5173,http://localhost:3000"
    )]
    allowed_origins: Vec<String>,

    /// Deployment environment ("production" enables HSTS)
    #[arg(long = "env", env = "SIAGA_ENV", default_value = "development")]
    environment: String,

    /// Token required to publish events (anyone may publish when unset)
    #[arg(long, env = "SIAGA_ADMIN_TOKEN")]
    admin_token: Option<String>,

    /// Requests allowed per rate limit window
    #[arg(long, default_value = "100")]
    rate_limit_max: u32,

    /// Rate limit window in seconds
    #[arg(long, default_value = "60")]
    rate_limit_window_secs: u64,

    /// Minimum interval between two signal ticks (milliseconds)
    #[arg(long, default_value = "1000")]
    signal_interval_ms: u64,

    /// Minimum interval between two honored request_signal per connection (milliseconds)
    #[arg(long, default_value = "1000")]
    request_interval_ms: u64,

    /// Period of the server-driven signal broadcast (milliseconds, 0 disables)
    #[arg(long, default_value = "5000")]
    signal_period_ms: u64,

    /// Events kept per kind
    #[arg(long, default_value = "1000")]
    store_capacity: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            allowed_origins: args.allowed_origins,
            production: args.environment.eq_ignore_ascii_case("production"),
            rate_limit: RateLimitPolicy::new(
                Duration::from_secs(args.rate_limit_window_secs),
                args.rate_limit_max,
            ),
            signal_min_interval: Duration::from_millis(args.signal_interval_ms),
            signal_request_interval: Duration::from_millis(args.request_interval_ms),
            signal_broadcast_period: (args.signal_period_ms > 0)
                .then(|| Duration::from_millis(args.signal_period_ms)),
            store_capacity: args.store_capacity,
            admin_token: args.admin_token.filter(|token| !token.is_empty()),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let config = ServerConfig::from(Args::parse());
    if config.admin_token.is_none() {
        tracing::warn!("No admin token configured, every connection may publish events");
    }

    let store = Arc::new(InMemoryEventStore::with_capacity(config.store_capacity));
    let server = Server::from_config(config, store, Arc::new(SystemClock));
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
