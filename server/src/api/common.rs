use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

pub async fn request_logger(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = std::time::Instant::now();
    let response = next.run(req).await;
    tracing::info!(
        "{} {} - status: {}, latency: {}ms",
        method,
        uri,
        response.status(),
        start.elapsed().as_millis()
    );
    response
}

/// Unmatched routes: answer CORS preflights with an empty 200, everything
/// else with the JSON 404 body the widget expects.
pub async fn handle_fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "status": "error",
            "message": "Endpoint not found"
        })),
    )
        .into_response()
}
