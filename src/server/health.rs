//! Liveness endpoints.
//!
//! Neither touches the repository, so both answer while a sync is running.

use axum::Json;
use axum::http::StatusCode;
use serde_json::{Value, json};

/// Message served at `/`.
pub const ROOT_MESSAGE: &str = "GitHub Webhook Receiver is running";

/// `GET /`: JSON banner identifying the service.
pub async fn root_handler() -> Json<Value> {
    Json(json!({ "message": ROOT_MESSAGE }))
}

/// Health check handler.
///
/// Returns 200 OK with the text "OK" for load balancers and orchestrators.
///
/// # Example
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: text/plain
///
/// OK
/// ```
pub async fn health_handler() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
