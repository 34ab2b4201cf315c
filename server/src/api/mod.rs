use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub mod chat;
pub mod common;
mod status;

pub fn build_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Health / status
        .route("/", get(status::handle_status))
        .route("/api", get(status::handle_status))
        // Chat
        .route("/api/chat", post(chat::handle_chat))
        // Cancellation registry
        .route("/api/cancel", post(chat::handle_cancel))
        .route("/api/requests/:id", get(chat::handle_request_status))
        // Everything else: CORS preflight or JSON 404
        .fallback(common::handle_fallback)
        .with_state(state)
}
