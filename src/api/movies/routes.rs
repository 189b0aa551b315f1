use crate::api::models::AppState;
use crate::api::movies::handlers::{
    enhance_movie_handler, movie_details_handler, related_movies_fast_handler,
    related_movies_handler,
};
use axum::{routing::get, Router};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/movies/{id}", get(movie_details_handler))
        .route("/api/movies/{id}/enhance", get(enhance_movie_handler))
        .route("/api/movies/{id}/related", get(related_movies_handler))
        .route("/api/movies/{id}/related/fast", get(related_movies_fast_handler))
}
