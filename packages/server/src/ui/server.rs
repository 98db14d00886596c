//! Server execution logic.

use std::{future::Future, net::SocketAddr, sync::Arc};

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::get,
};
use siaga_shared::{signal::SignalState, time::Clock};
use tokio::{net::TcpListener, task::JoinHandle, time::MissedTickBehavior};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::{
    config::ServerConfig,
    domain::{ConnectionRegistry, EventStore, SignalSource},
    infrastructure::{InMemoryRateLimiter, RandomWalkSignalGenerator, WebSocketConnectionRegistry},
    usecase::{
        ConnectObserverUseCase, DisconnectObserverUseCase, GetRecentEventsUseCase,
        PublishEventUseCase, RefreshSignalUseCase,
    },
};

use super::{
    handler::{get_activities, get_evacuations, get_incidents, health_check, websocket_handler},
    middleware::rate_limit_middleware,
    signal::shutdown_signal,
    state::AppState,
};

/// Real-time event hub
///
/// # Example
///
/// ```ignore
/// let store = Arc::new(InMemoryEventStore::with_capacity(config.store_capacity));
/// let server = Server::from_config(config, store, Arc::new(SystemClock));
/// server.run().await?;
/// ```
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Wire the hub's dependencies from a configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `store` - Where accepted events are recorded
    /// * `clock` - Time source for stamps, throttles and the rate limiter
    pub fn from_config(
        config: ServerConfig,
        store: Arc<dyn EventStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        // 1. Registry and signal source
        let registry: Arc<dyn ConnectionRegistry> = Arc::new(WebSocketConnectionRegistry::new());
        let signal_source: Arc<dyn SignalSource> = Arc::new(RandomWalkSignalGenerator::new(
            SignalState::default(),
            config.signal_min_interval,
            clock.clone(),
        ));

        // 2. UseCases
        let connect_observer_usecase = Arc::new(ConnectObserverUseCase::new(
            registry.clone(),
            signal_source.clone(),
            clock.clone(),
        ));
        let disconnect_observer_usecase =
            Arc::new(DisconnectObserverUseCase::new(registry.clone()));
        let publish_event_usecase = Arc::new(PublishEventUseCase::new(
            store.clone(),
            registry.clone(),
            clock.clone(),
        ));
        let refresh_signal_usecase =
            Arc::new(RefreshSignalUseCase::new(signal_source, registry.clone()));
        let get_recent_events_usecase = Arc::new(GetRecentEventsUseCase::new(store));

        // 3. AppState
        let rate_limiter = Arc::new(InMemoryRateLimiter::new(
            config.rate_limit,
            clock.clone(),
        ));
        let state = Arc::new(AppState {
            connect_observer_usecase,
            disconnect_observer_usecase,
            publish_event_usecase,
            refresh_signal_usecase,
            get_recent_events_usecase,
            registry,
            rate_limiter,
            clock,
            signal_request_interval_ms: i64::try_from(config.signal_request_interval.as_millis())
                .unwrap_or(i64::MAX),
            admin_token: config.admin_token.clone(),
        });

        Self { config, state }
    }

    pub fn state(&self) -> Arc<AppState> {
        self.state.clone()
    }

    /// Build the router with all routes and layers
    pub fn router(&self) -> Router {
        let router = Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/activities", get(get_activities))
            .route("/api/incidents", get(get_incidents))
            .route("/api/evacuations", get(get_evacuations))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                rate_limit_middleware,
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_XSS_PROTECTION,
                HeaderValue::from_static("1; mode=block"),
            ));

        let router = if self.config.production {
            router.layer(SetResponseHeaderLayer::overriding(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=31536000; includeSubDomains"),
            ))
        } else {
            router
        };

        router
            .layer(self.cors_layer())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    fn cors_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .config
            .allowed_origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-requested-with")])
            .allow_credentials(true)
    }

    /// Spawn the periodic signal broadcast, if enabled
    pub fn spawn_signal_ticker(&self) -> Option<JoinHandle<()>> {
        let period = self.config.signal_broadcast_period?;
        let usecase = self.state.refresh_signal_usecase.clone();

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match usecase.tick_and_broadcast().await {
                    Ok(Some(state)) => tracing::debug!("Signal ticked: {:?}", state),
                    Ok(None) => {}
                    Err(e) => tracing::warn!("Signal broadcast failed: {}", e),
                }
            }
        }))
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ticker = self.spawn_signal_ticker();
        let app = self.router();

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        if let Some(ticker) = ticker {
            ticker.abort();
        }
        result
    }

    /// Run the hub
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the configured address or
    /// if there's an error during server execution.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = self.config.bind_addr();
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Event hub listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use siaga_shared::time::SystemClock;

    use super::*;
    use crate::infrastructure::InMemoryEventStore;

    #[tokio::test]
    async fn test_oversized_signal_interval_saturates() {
        // テスト項目: i64 に収まらない request_signal 間隔は負にならず i64::MAX に丸められる
        // given (前提条件):
        let config = ServerConfig {
            signal_request_interval: Duration::MAX,
            signal_broadcast_period: None,
            ..ServerConfig::default()
        };

        // when (操作):
        let server = Server::from_config(
            config,
            Arc::new(InMemoryEventStore::new()),
            Arc::new(SystemClock),
        );

        // then (期待する結果):
        assert_eq!(server.state().signal_request_interval_ms, i64::MAX);
    }
}
