//! HTTP API route definitions

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;
use super::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let api_v1 = Router::new()
        .route(
            "/configurations",
            post(handlers::create_configuration).get(handlers::list_configurations),
        )
        .route(
            "/configurations/{config_id}",
            get(handlers::get_configuration).delete(handlers::delete_configuration),
        )
        .route("/ingest/start", post(handlers::start_ingestion))
        .with_state(state);

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api_v1)
}
