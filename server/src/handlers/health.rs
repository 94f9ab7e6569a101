//! Liveness probe.

use axum::Json;
use serde_json::{json, Value};

/// Report that the process is up.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
