pub mod models;
pub mod movies;
pub mod search;

// Re-exports
pub use models::*;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

// Health handler (simple, keep here)
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let providers = state.service.provider_status();
    Json(HealthResponse {
        status: "healthy".to_string(),
        trakt_api_configured: providers.catalog_configured,
        tmdb_api_configured: providers.image_configured,
        optimization: "enabled".to_string(),
    })
}

async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: StatusCode::NOT_FOUND.to_string(),
            message: "Endpoint not found".to_string(),
        }),
    )
}

/// All API routes, without transport layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .merge(search::routes())
        .merge(movies::routes())
        .fallback(not_found_handler)
        .with_state(state)
}
