//! API route definitions

use super::handlers::{self, RelayState};
use super::ws_handlers;
use axum::{
    routing::{get, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: RelayState) -> Router {
    // The display layer is served from its own origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // ====================================================================
        // Movies
        // ====================================================================
        .route(
            "/api/movies",
            get(handlers::list_movies).post(handlers::create_movie),
        )
        .route(
            "/api/movies/{id}",
            put(handlers::update_movie).delete(handlers::delete_movie),
        )
        // Push channel
        .route("/ws", get(ws_handlers::ws_events))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
