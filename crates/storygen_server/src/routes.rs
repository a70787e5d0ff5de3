//! Plain HTTP routes.

use axum::Json;
use serde_json::{Value, json};

/// Service name reported by the health check.
pub const HEALTH_SERVICE: &str = "storygen-backend";

/// `GET /health`
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": HEALTH_SERVICE,
        "architecture": "agent-based",
    }))
}
