//! API route handlers
//!
//! - `health`: liveness, readiness and Prometheus metrics
//! - `search`: allergy-aware medicine search and free-text search
//! - `regions`: mock region and pharmacy lookup

pub mod health;
pub mod regions;
pub mod search;

use crate::error::ServerError;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

pub const ALLERGY_CAVEAT: &str = "Allergy filtering compares free-text side effects \
with the stated allergy using a sentence encoder. It is best effort and is not \
medical advice.";

/// Service info (GET /)
pub async fn api_info() -> impl IntoResponse {
    Json(json!({
        "name": "medsearch",
        "version": env!("CARGO_PKG_VERSION"),
        "notice": ALLERGY_CAVEAT,
        "endpoints": [
            "/medicines",
            "/nlp-search",
            "/regions",
            "/pharmacies",
            "/health",
            "/ready",
            "/metrics"
        ]
    }))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
