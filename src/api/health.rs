// src/api/health.rs
use axum::http::StatusCode;
use axum::{extract::State, routing::get, Json, Router};
use serde_json::json;

use crate::app_state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health/live", get(liveness_check))
        .route("/health/ready", get(readiness_check))
}

/// Verifies that the API is running; does not touch storage.
async fn liveness_check() -> Json<serde_json::Value> {
    Json(json!({ "success": true, "message": "API is live" }))
}

/// Pings the request store and reports the number of live sessions.
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    state.store.find_by_id(0).await.map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "success": false, "error": "Storage unavailable", "details": e.to_string() })
                .to_string(),
        )
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "API is ready",
        "live_sessions": state.registry.session_count(),
    })))
}
