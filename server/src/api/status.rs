use crate::state::AppState;
use axum::{extract::State, Json};
use std::sync::Arc;

/// `GET /` and `GET /api` health check.
pub async fn handle_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "message": "Tony Tech Insights API is running",
        "environment": state.config.environment,
        "deepseek_connected": state.config.deepseek_configured(),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().timestamp_millis(),
    }))
}
