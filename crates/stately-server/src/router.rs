use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::backend::Backend;
use crate::handler;

/// Build the axum router: the remote-state endpoint at `base_path` plus
/// health and info endpoints.
pub fn build_router(backend: Arc<Backend>, base_path: &str, max_body_size: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/info", get(handler::info_handler))
        .route(base_path, any(handler::state_handler))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(backend)
}
