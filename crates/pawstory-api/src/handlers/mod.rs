//! HTTP request handlers.

pub mod jobs;
pub mod projects;

use axum::Json;
use serde_json::{json, Value};

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "pawstory-api",
    }))
}
