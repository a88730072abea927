//! Health and readiness handlers

use crate::state::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// Liveness probe
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe with uptime
pub async fn ready_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "ready": true,
        "uptime_seconds": state.uptime_secs(),
    }))
}
