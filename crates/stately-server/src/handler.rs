use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::backend::Backend;
use crate::request::StateRequest;

/// Custom HTTP method the Terraform http backend uses to acquire a lock.
pub const LOCK_METHOD: &str = "LOCK";
/// Custom HTTP method the Terraform http backend uses to release a lock.
pub const UNLOCK_METHOD: &str = "UNLOCK";

/// Health check response.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler() -> Json<serde_json::Value> {
    Json(json!({
        "name": "stately",
        "version": env!("CARGO_PKG_VERSION"),
        "operations": ["GET", "POST", "DELETE", LOCK_METHOD, UNLOCK_METHOD],
    }))
}

/// Dispatch a remote-state request by HTTP method.
pub async fn state_handler(
    State(backend): State<Arc<Backend>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = StateRequest::new(method, uri, headers, body);
    let response = match request.method.as_str() {
        "GET" => backend.get_state(&request).await,
        "POST" => backend.put_state(&request).await,
        "DELETE" => backend.delete_state(&request).await,
        LOCK_METHOD => backend.lock_state(&request).await,
        UNLOCK_METHOD => backend.unlock_state(&request).await,
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };
    response.into_response()
}
