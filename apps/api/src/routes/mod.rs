pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::render::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Layout and preview
        .route("/api/v1/posters/layout", post(handlers::handle_layout))
        .route("/api/v1/posters/preview", post(handlers::handle_preview))
        .route("/api/v1/viewport/fit", post(handlers::handle_viewport_fit))
        // Export
        .route("/api/v1/posters/export", post(handlers::handle_export))
        .with_state(state)
}
