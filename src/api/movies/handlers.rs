use crate::api::models::*;
use crate::model::MovieRecord;
use axum::{extract::State, Json};
use serde_json::Value;
use tracing::info;

const RELATED_FAILED: &str = "Failed to get related movies";

pub async fn movie_details_handler(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> Result<Json<Value>, AppError> {
    info!(id, "Fetching movie details");

    let detail = state
        .service
        .movie_details(id)
        .await
        .map_err(|e| AppError::from_service(e, "Failed to get movie details"))?;

    Ok(Json(detail))
}

pub async fn enhance_movie_handler(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> Result<Json<MovieRecord>, AppError> {
    info!(id, "Enhancing movie");

    let record = state
        .service
        .enhance_movie(id)
        .await
        .map_err(|e| AppError::from_service(e, "Failed to enhance movie"))?;

    Ok(Json(record))
}

pub async fn related_movies_handler(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> Result<Json<Vec<MovieRecord>>, AppError> {
    info!(id, "Fetching related movies");

    let records = state
        .service
        .related_movies(id)
        .await
        .map_err(|e| AppError::from_service(e, RELATED_FAILED))?;

    Ok(Json(records))
}

pub async fn related_movies_fast_handler(
    State(state): State<AppState>,
    MovieId(id): MovieId,
) -> Result<Json<Vec<Value>>, AppError> {
    info!(id, "Fetching related movies (fast)");

    let related = state
        .service
        .related_movies_fast(id)
        .await
        .map_err(|e| AppError::from_service(e, RELATED_FAILED))?;

    Ok(Json(related))
}
