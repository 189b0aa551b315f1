use crate::api::models::*;
use crate::model::MovieRecord;
use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::Value;
use tracing::info;

const SEARCH_FAILED: &str = "Failed to search movies";

pub async fn search_movies_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<MovieRecord>>, AppError> {
    let query = params.query.unwrap_or_default();
    info!(query = %query, "Searching movies");

    let records = state
        .service
        .search_movies(&query)
        .await
        .map_err(|e| AppError::from_service(e, SEARCH_FAILED))?;

    Ok(Json(records))
}

pub async fn search_movies_fast_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Value>>, AppError> {
    let query = params.query.unwrap_or_default();
    info!(query = %query, "Searching movies (fast)");

    let hits = state
        .service
        .search_movies_fast(&query)
        .await
        .map_err(|e| AppError::from_service(e, SEARCH_FAILED))?;

    Ok(Json(hits))
}
