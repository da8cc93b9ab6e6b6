//! Warehouse name probes

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NormalizeQuery {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct NormalizeResponse {
    pub input: String,
    pub canonical: String,
    pub is_central: bool,
}

/// Show how a free-text warehouse name resolves
pub async fn normalize_warehouse(
    State(state): State<AppState>,
    Query(query): Query<NormalizeQuery>,
) -> Json<NormalizeResponse> {
    let canonical = state.resolver.normalize(&query.name);
    Json(NormalizeResponse {
        is_central: canonical == state.resolver.central(),
        canonical,
        input: query.name,
    })
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub a: String,
    pub b: String,
}

#[derive(Debug, Serialize)]
pub struct MatchResponse {
    pub a: String,
    pub b: String,
    pub matches: bool,
}

pub async fn match_warehouses(
    State(state): State<AppState>,
    Query(query): Query<MatchQuery>,
) -> Json<MatchResponse> {
    Json(MatchResponse {
        matches: state.resolver.matches(&query.a, &query.b),
        a: query.a,
        b: query.b,
    })
}
