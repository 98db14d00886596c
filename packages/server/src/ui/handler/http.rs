//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{domain::EventKind, ui::state::AppState};

/// Query parameters for the recent-event lists
#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let connections = state.registry.count().await;
    Json(serde_json::json!({"status": "ok", "connections": connections}))
}

/// Most recent activities, newest first
pub async fn get_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    recent(&state, EventKind::ActivityCreate, query.limit).await
}

/// Most recent incident updates, newest first
pub async fn get_incidents(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    recent(&state, EventKind::IncidentUpdate, query.limit).await
}

/// Most recent evacuation updates, newest first
pub async fn get_evacuations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    recent(&state, EventKind::EvacuationUpdate, query.limit).await
}

async fn recent(
    state: &AppState,
    kind: EventKind,
    limit: Option<usize>,
) -> Result<Json<Vec<Value>>, StatusCode> {
    match state.get_recent_events_usecase.execute(kind, limit).await {
        Ok(events) => Ok(Json(events.iter().map(|e| e.to_json()).collect())),
        Err(e) => {
            tracing::error!("Failed to load recent {}: {}", kind, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
