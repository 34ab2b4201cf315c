//! Chat endpoint handlers.
//!
//! Error policy is deliberately "masked": `/api/chat` always answers 200,
//! and upstream trouble is reported in-band through `using_deepseek: false`
//! plus an `error` string next to substituted fallback text. See DESIGN.md.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::chat::registry::RequestStatus;
use crate::chat::{classify, fallback};
use crate::state::AppState;

const SHORT_PROMPT_REPLY: &str =
    "I'd be happy to help! Please provide more details about what you'd like to discuss or create.";

const CANCELLED_REPLY: &str = "This request was cancelled before a reply was generated.";

/// Prompts below this length are answered directly, without spending
/// deadline budget or upstream tokens.
const MIN_PROMPT_LEN: usize = 5;

#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub request_id: String,
    pub tool_calls: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub using_deepseek: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
}

impl ChatResponse {
    fn new(response: impl Into<String>, session_id: String, request_id: String) -> Self {
        Self {
            response: response.into(),
            session_id,
            request_id,
            tool_calls: Vec::new(),
            using_deepseek: None,
            error: None,
            elapsed_ms: None,
            tokens: None,
        }
    }
}

/// `POST /api/chat`.
///
/// The body is parsed defensively: whatever fails to parse is treated as an
/// empty request rather than a 400, matching the widget's expectations.
pub async fn handle_chat(State(state): State<Arc<AppState>>, body: String) -> Json<ChatResponse> {
    let parsed: ChatRequest = serde_json::from_str(&body).unwrap_or_else(|e| {
        tracing::warn!("unparseable chat body ({}), continuing with defaults", e);
        ChatRequest::default()
    });

    let session_id = parsed
        .session_id
        .filter(|s| !s.is_empty())
        .unwrap_or_else(new_session_id);
    let request_id = new_request_id();
    let prompt = parsed.prompt;

    if prompt.len() < MIN_PROMPT_LEN {
        return Json(ChatResponse::new(SHORT_PROMPT_REPLY, session_id, request_id));
    }

    let profile = classify::classify(&prompt);
    tracing::debug!(
        request_id = %request_id,
        template = profile.template_request,
        vietnamese = profile.vietnamese,
        "dispatching chat prompt"
    );

    let system_prompt = profile.system_prompt();
    let started = Instant::now();
    let cancel = state.requests.register(&request_id, &session_id);

    let outcome = tokio::select! {
        _ = cancel.notified() => None,
        result = state
            .deepseek
            .complete(&system_prompt, &prompt, profile.max_tokens()) => Some(result),
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let response = match outcome {
        None => {
            // Registry already holds the cancelled status.
            tracing::info!(request_id = %request_id, "chat request cancelled by client");
            let mut resp = ChatResponse::new(CANCELLED_REPLY, session_id, request_id);
            resp.using_deepseek = Some(false);
            resp.error = Some("cancelled".into());
            resp
        }
        Some(Ok(completion)) => {
            state
                .requests
                .finish(&request_id, RequestStatus::Completed, None);
            let mut resp = ChatResponse::new(completion.content, session_id, request_id);
            resp.using_deepseek = Some(true);
            resp.elapsed_ms = Some(elapsed_ms);
            resp.tokens = completion.total_tokens;
            resp
        }
        Some(Err(e)) => {
            tracing::warn!(
                request_id = %request_id,
                error = %e,
                elapsed_ms,
                "DeepSeek call failed, serving fallback"
            );
            state
                .requests
                .finish(&request_id, RequestStatus::Error, Some(e.to_string()));
            let text = fallback::generate(&prompt, &profile, &mut rand::thread_rng());
            let mut resp = ChatResponse::new(text, session_id, request_id);
            resp.using_deepseek = Some(false);
            resp.error = Some(e.to_string());
            resp.elapsed_ms = Some(elapsed_ms);
            resp
        }
    };

    Json(response)
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub request_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

/// `POST /api/cancel`. Cancellation is cooperative: it only succeeds while
/// the request is still being processed.
pub async fn handle_cancel(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CancelRequest>,
) -> Json<CancelResponse> {
    if req.request_id.is_empty() {
        return Json(CancelResponse {
            success: false,
            message: "No request ID provided".into(),
        });
    }

    if state.requests.cancel(&req.request_id) {
        tracing::info!(request_id = %req.request_id, "request cancelled");
        Json(CancelResponse {
            success: true,
            message: format!("Request {} cancelled successfully", req.request_id),
        })
    } else {
        Json(CancelResponse {
            success: false,
            message: format!(
                "Request {} could not be cancelled (not found or already completed)",
                req.request_id
            ),
        })
    }
}

/// `GET /api/requests/:id`.
pub async fn handle_request_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.requests.status_view(&id) {
        Some(view) => Json(view).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "status": "error",
                "message": format!("Request {id} not found"),
            })),
        )
            .into_response(),
    }
}

fn new_request_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("req_{}", &hex[..10])
}

fn new_session_id() -> String {
    format!("session-{}", Uuid::new_v4().simple())
}
