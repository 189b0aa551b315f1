use crate::api::models::AppState;
use crate::api::search::handlers::{search_movies_fast_handler, search_movies_handler};
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/search/movies", get(search_movies_handler))
        .route("/api/search/movies/fast", get(search_movies_fast_handler))
}
