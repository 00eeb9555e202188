/*
 * Responsibility
 * - GET /health (疎通用, gateway の exemption 対象)
 */
use axum::Json;
use serde_json::{Value, json};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
