use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Liveness probe
pub async fn health_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "medsearch",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
    }))
}

/// Readiness probe. The matcher is built before the listener binds, so a
/// running server is always ready; the body reports what was loaded.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let index = state.matcher.index();

    Json(json!({
        "status": "ready",
        "service": "medsearch",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": state.uptime_seconds(),
        "index": {
            "entries": index.len(),
            "dimension": index.dim(),
            "model": index.model_name(),
        },
        "regions": state.matcher.regions().regions().len(),
    }))
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let handle = state.metrics.as_ref().ok_or(ServerError::MetricsDisabled)?;
    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    ))
}
