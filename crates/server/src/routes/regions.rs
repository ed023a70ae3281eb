use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use matcher::{Pharmacy, Region};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct PharmacyParams {
    pub region_code: String,
}

/// List the known regions
pub async fn list_regions(State(state): State<Arc<ServerState>>) -> Json<Vec<Region>> {
    Json(state.matcher.regions().regions().to_vec())
}

/// Pharmacies of one region; an unknown region has none.
pub async fn list_pharmacies(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<PharmacyParams>, QueryRejection>,
) -> ServerResult<Json<Vec<Pharmacy>>> {
    let Query(params) = params?;
    Ok(Json(
        state.matcher.regions().pharmacies(&params.region_code).to_vec(),
    ))
}
