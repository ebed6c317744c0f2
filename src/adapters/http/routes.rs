//! Route definitions.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers::{self, AppState};

/// Builds the application router with tracing, CORS and a per-request
/// timeout.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/turn", post(handlers::handle_turn))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
