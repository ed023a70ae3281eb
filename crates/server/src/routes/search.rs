use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use matcher::{MedicineQuery, NlpMatch, ScoredCandidate};
use serde::Deserialize;
use std::sync::Arc;

/// Query string of `GET /medicines`. Omitted numbers fall back to the
/// matcher's configured defaults.
#[derive(Debug, Deserialize)]
pub struct MedicinesParams {
    pub symptom: String,
    #[serde(default)]
    pub allergy: String,
    pub region: Option<String>,
    pub top_k: Option<i64>,
    pub min_confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct NlpParams {
    pub top_k: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct NlpRequest {
    pub prompt: String,
}

/// Allergy-aware medicine search (GET /medicines)
pub async fn search_medicines(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<MedicinesParams>, QueryRejection>,
) -> ServerResult<Json<Vec<ScoredCandidate>>> {
    let Query(params) = params?;
    let defaults = state.matcher.config();

    let mut query = MedicineQuery::new(params.symptom, params.allergy)
        .with_top_k(params.top_k.unwrap_or(defaults.default_top_k))
        .with_min_confidence(params.min_confidence.unwrap_or(defaults.default_min_confidence));
    if let Some(region) = params.region {
        query = query.with_region(region);
    }

    let results = state.matcher.search_medicines(&query).await?;
    Ok(Json(results))
}

/// Free-text search (POST /nlp-search)
pub async fn nlp_search(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<NlpParams>, QueryRejection>,
    body: Result<Json<NlpRequest>, JsonRejection>,
) -> ServerResult<Json<Vec<NlpMatch>>> {
    let Query(params) = params?;
    let Json(body) = body?;
    let top_k = params
        .top_k
        .unwrap_or(state.matcher.config().default_nlp_top_k);

    let results = state.matcher.nlp_search(&body.prompt, top_k).await?;
    Ok(Json(results))
}
