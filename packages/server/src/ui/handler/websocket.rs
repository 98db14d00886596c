//! WebSocket connection handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use siaga_shared::protocol::{Envelope, ErrorPayload, event};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionInfo, EventKind, IntervalThrottle},
    ui::state::AppState,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<ConnectQuery>,
) -> impl IntoResponse {
    let can_publish = state.can_publish(query.token.as_deref());

    // Registration waits for the upgrade so a failed handshake leaves no entry behind
    ws.on_upgrade(move |socket| handle_socket(socket, state, addr, can_publish))
}

/// Spawns a task that drains the connection's channel into the WebSocket sink.
///
/// Frames leave in the order they were queued, so two broadcasts never reach one
/// connection reordered.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, addr: SocketAddr, can_publish: bool) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive frames
    let (tx, rx) = mpsc::unbounded_channel();

    let info = state
        .connect_observer_usecase
        .execute(addr.ip().to_string(), can_publish, tx)
        .await;
    tracing::info!(
        "Connection '{}' from {} registered (can_publish: {})",
        info.id,
        addr,
        can_publish
    );

    // Start draining before the initial sync so the first frame goes out right away
    let mut send_task = pusher_loop(rx, sender);

    if let Err(e) = state.connect_observer_usecase.initial_sync(&info.id).await {
        tracing::warn!("Initial sync for '{}' failed: {}", info.id, e);
    }

    let state_clone = state.clone();
    let info_clone = info.clone();

    // Frames from one connection are handled one at a time, in arrival order
    let mut recv_task = tokio::spawn(async move {
        let mut throttle = IntervalThrottle::new(state_clone.signal_request_interval_ms);

        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", info_clone.id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatch_frame(&state_clone, &info_clone, &mut throttle, text.as_str()).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", info_clone.id);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.disconnect_observer_usecase.execute(&info.id).await;
}

/// Routes one inbound text frame.
async fn dispatch_frame(
    state: &AppState,
    origin: &ConnectionInfo,
    throttle: &mut IntervalThrottle,
    text: &str,
) {
    let now = state.clock.now_millis();
    state.registry.touch(&origin.id, now).await;

    let envelope = match Envelope::from_frame(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::warn!("Malformed frame from '{}': {}", origin.id, e);
            let payload = ErrorPayload::new("Malformed message");
            let data = serde_json::to_value(&payload).unwrap_or_default();
            if let Err(e) = state.registry.send_to(&origin.id, event::ERROR, &data).await {
                tracing::debug!("Could not report error to '{}': {}", origin.id, e);
            }
            return;
        }
    };

    if envelope.event == event::REQUEST_SIGNAL {
        if !throttle.try_acquire(now) {
            tracing::debug!("Ignoring request_signal from '{}' (too soon)", origin.id);
            return;
        }
        if let Err(e) = state.refresh_signal_usecase.request(&origin.id).await {
            tracing::warn!("Failed to answer request_signal from '{}': {}", origin.id, e);
        }
        return;
    }

    match EventKind::from_inbound(&envelope.event) {
        Some(kind) => {
            // Failures are already reported to the origin by the use case
            let _ = state
                .publish_event_usecase
                .execute(origin, kind, envelope.data)
                .await;
        }
        None => {
            tracing::warn!("Ignoring unknown event '{}' from '{}'", envelope.event, origin.id);
        }
    }
}
