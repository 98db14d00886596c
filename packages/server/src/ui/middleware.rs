//! HTTP middleware.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::state::AppState;

/// Rate limiting middleware keyed by peer IP.
///
/// Rejects with `429 Too Many Requests` and a `Retry-After` of one window.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let key = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !state.rate_limiter.allow(&key) {
        tracing::warn!("Rate limit exceeded for '{}' on {}", key, req.uri().path());
        let retry_after = HeaderValue::from(state.rate_limiter.policy().window.as_secs());
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after)],
            Json(serde_json::json!({"error": "Too many requests"})),
        )
            .into_response();
    }

    next.run(req).await
}
