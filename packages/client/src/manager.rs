//! Client connection manager.
//!
//! One supervisor task per lifecycle drives `Connecting → Connected`, and on
//! failure or drop goes through `Reconnecting` with exponential backoff until the
//! attempt ceiling is hit. Listeners live outside the supervisor so they survive
//! reconnects; only [`ConnectionManager::disconnect`] clears them.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::{SeedableRng, rngs::StdRng};
use serde_json::Value;
use siaga_shared::{
    protocol::{Envelope, ErrorPayload, event},
    signal::{Jitter, SignalState},
    time::{Clock, SystemClock},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    backoff::{BackoffPolicy, BackoffState},
    listener::{ListenerRegistry, Subscription},
    transport::{Connector, WebSocketConnector},
};

/// Message delivered to `error` listeners once the backoff ceiling is exceeded
pub const TERMINAL_FAILURE_MESSAGE: &str = "Failed to connect to server";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManagerConfig {
    pub backoff: BackoffPolicy,
    /// Smoothing applied to inbound `signal_update` readings
    pub jitter: Jitter,
    /// Fixed seed for the smoothing RNG (entropy when `None`)
    pub rng_seed: Option<u64>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            backoff: BackoffPolicy::default(),
            jitter: Jitter::CLIENT,
            rng_seed: None,
        }
    }
}

struct ManagerState {
    phase: ConnectionPhase,
    backoff: BackoffState,
    outbound: Option<mpsc::UnboundedSender<String>>,
    task: Option<JoinHandle<()>>,
    /// Bumped by every connect/disconnect so a stale supervisor can tell it was replaced
    generation: u64,
    last_signal_update: Option<i64>,
}

struct Inner {
    url: String,
    config: ManagerConfig,
    connector: Arc<dyn Connector>,
    clock: Arc<dyn Clock>,
    listeners: ListenerRegistry,
    state: Mutex<ManagerState>,
    rng: Mutex<StdRng>,
}

/// Keeps one connection to the hub alive and fans its events out locally.
///
/// Cloning yields another handle to the same connection.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Manager for a WebSocket URL with default settings
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_connector(
            url,
            ManagerConfig::default(),
            Arc::new(WebSocketConnector),
            Arc::new(SystemClock),
        )
    }

    pub fn with_connector(
        url: impl Into<String>,
        config: ManagerConfig,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                config,
                connector,
                clock,
                listeners: ListenerRegistry::new(),
                state: Mutex::new(ManagerState {
                    phase: ConnectionPhase::Disconnected,
                    backoff: BackoffState::default(),
                    outbound: None,
                    task: None,
                    generation: 0,
                    last_signal_update: None,
                }),
                rng: Mutex::new(rng),
            }),
        }
    }

    /// Start connecting in the background.
    ///
    /// No-op while a connection (or a retry cycle) already exists. Must be called
    /// from within a tokio runtime.
    pub fn connect(&self) {
        let mut state = self.inner.lock_state();
        if state.task.is_some() {
            tracing::debug!("connect() ignored, connection already active");
            return;
        }

        state.generation += 1;
        state.phase = ConnectionPhase::Connecting;
        state.backoff.reset();
        let generation = state.generation;
        state.task = Some(tokio::spawn(supervise(self.inner.clone(), generation)));
    }

    /// Tear the connection down, cancel any pending retry and drop every listener
    pub fn disconnect(&self) {
        let task = {
            let mut state = self.inner.lock_state();
            state.generation += 1;
            state.phase = ConnectionPhase::Disconnected;
            state.outbound = None;
            state.backoff.reset();
            state.task.take()
        };
        if let Some(task) = task {
            task.abort();
        }
        self.inner.listeners.clear();
        tracing::info!("Disconnected from {}", self.inner.url);
    }

    /// Send an event if connected; otherwise log a warning and drop it
    pub fn emit(&self, event: &str, data: Value) {
        self.inner.emit(event, data);
    }

    pub fn subscribe<F>(&self, event: &str, callback: F) -> Subscription
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.inner.listeners.subscribe(event, callback)
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner.listeners.count(event)
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.inner.lock_state().phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase() == ConnectionPhase::Connected
    }

    /// When the last `signal_update` was delivered to listeners (Unix millis)
    pub fn last_signal_update(&self) -> Option<i64> {
        self.inner.lock_state().last_signal_update
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn set_phase(&self, generation: u64, phase: ConnectionPhase) -> bool {
        let mut state = self.lock_state();
        if state.generation != generation {
            return false;
        }
        state.phase = phase;
        true
    }

    fn on_open(&self, generation: u64, outbound: mpsc::UnboundedSender<String>) -> bool {
        let mut state = self.lock_state();
        if state.generation != generation {
            return false;
        }
        state.phase = ConnectionPhase::Connected;
        state.backoff.reset();
        state.outbound = Some(outbound);
        true
    }

    fn on_drop(&self, generation: u64) {
        let mut state = self.lock_state();
        if state.generation == generation {
            state.outbound = None;
        }
    }

    /// Count a failure and decide what happens next.
    ///
    /// Returns the delay before the next attempt, or `None` when the supervisor
    /// must stop (ceiling exceeded, or replaced by a newer lifecycle).
    fn handle_reconnect(&self, generation: u64) -> Option<std::time::Duration> {
        let mut state = self.lock_state();
        if state.generation != generation {
            return None;
        }

        let next = state.backoff.next_delay(&self.config.backoff);
        match next {
            Some(delay) => {
                state.phase = ConnectionPhase::Reconnecting;
                tracing::info!(
                    "Reconnecting in {} ms... (attempt {}/{})",
                    delay.as_millis(),
                    state.backoff.attempt(),
                    self.config.backoff.max_attempts
                );
                Some(delay)
            }
            None => {
                state.phase = ConnectionPhase::Disconnected;
                state.outbound = None;
                // Detach ourselves so a manual connect() can start over
                state.task = None;
                drop(state);

                tracing::error!(
                    "Failed to reconnect after {} attempts",
                    self.config.backoff.max_attempts
                );
                let payload = serde_json::to_value(ErrorPayload::new(TERMINAL_FAILURE_MESSAGE))
                    .unwrap_or_default();
                self.listeners.dispatch(event::ERROR, &payload);
                None
            }
        }
    }

    fn emit(&self, event: &str, data: Value) {
        let state = self.lock_state();
        let outbound = match (&state.phase, &state.outbound) {
            (ConnectionPhase::Connected, Some(outbound)) => outbound,
            _ => {
                tracing::warn!("Cannot emit '{}': not connected", event);
                return;
            }
        };

        match Envelope::new(event, data).to_frame() {
            Ok(frame) => {
                if outbound.send(frame).is_err() {
                    tracing::warn!("Cannot emit '{}': connection closed", event);
                }
            }
            Err(e) => tracing::warn!("Failed to encode '{}': {}", event, e),
        }
    }

    /// Deliver one inbound frame to local listeners
    fn deliver(&self, frame: &str) {
        let envelope = match Envelope::from_frame(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!("Ignoring malformed frame: {}", e);
                return;
            }
        };

        let data = if envelope.event == event::SIGNAL_UPDATE {
            self.smooth(envelope.data)
        } else {
            envelope.data
        };
        self.listeners.dispatch(&envelope.event, &data);
    }

    /// Apply the client-side jitter to a signal reading
    fn smooth(&self, data: Value) -> Value {
        let reading = match serde_json::from_value::<SignalState>(data.clone()) {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!("Unexpected signal_update payload: {}", e);
                return data;
            }
        };

        let smoothed = {
            let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            reading.perturbed(&self.config.jitter, &mut *rng)
        };
        self.lock_state().last_signal_update = Some(self.clock.now_millis());

        serde_json::to_value(&smoothed).unwrap_or(data)
    }
}

async fn supervise(inner: Arc<Inner>, generation: u64) {
    loop {
        if !inner.set_phase(generation, ConnectionPhase::Connecting) {
            return;
        }
        tracing::info!("Connecting to {}", inner.url);

        match inner.connector.connect(&inner.url).await {
            Ok(mut transport) => {
                if !inner.on_open(generation, transport.outbound.clone()) {
                    return;
                }
                tracing::info!("Connected to {}", inner.url);
                inner.emit(event::REQUEST_SIGNAL, Value::Null);

                while let Some(frame) = transport.inbound.recv().await {
                    inner.deliver(&frame);
                }

                inner.on_drop(generation);
                tracing::warn!("Connection to {} lost", inner.url);
            }
            Err(e) => {
                tracing::warn!("Connection attempt failed: {}", e);
            }
        }

        match inner.handle_reconnect(generation) {
            Some(delay) => tokio::time::sleep(delay).await,
            None => return,
        }
    }
}
