//! Router construction and shared state.

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use mediad_core::jobs::Orchestrator;

use crate::routes;

/// Shared application state. The orchestrator is internally `Arc`-backed,
/// so cloning per request is cheap.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/download", post(routes::submit))
        .route("/api/download/status/:id", get(routes::status))
        .route("/api/download/file/:id", get(routes::artifact))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
