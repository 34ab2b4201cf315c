//! Router-level tests for the chat gateway, with a throwaway axum listener
//! standing in for the DeepSeek API.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use std::sync::Arc;
use tonytech_server::api::build_routes;
use tonytech_server::config::GatewayConfig;
use tonytech_server::state::AppState;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

const SHORT_PROMPT_REPLY: &str =
    "I'd be happy to help! Please provide more details about what you'd like to discuss or create.";

fn test_app(api_base: &str, api_key: Option<&str>) -> Router {
    let config = GatewayConfig::new(
        api_key.map(String::from),
        api_base.to_string(),
        "deepseek-chat".into(),
        10_000,
        "test".into(),
    )
    .unwrap();
    build_routes(Arc::new(AppState::new(config)))
}

async fn send(
    app: &Router,
    method: &str,
    path: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(v) => Request::builder()
            .method(method)
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Serve a single canned reply on `/chat/completions` and return the base
/// URL, playing the upstream API.
async fn spawn_upstream(status: StatusCode, body: serde_json::Value) -> String {
    let app = Router::new().route(
        "/chat/completions",
        post(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn short_prompt_short_circuits_without_upstream() {
    // The base URL points nowhere; a short prompt must never reach it.
    let app = test_app("http://127.0.0.1:9", Some("sk-test"));
    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(serde_json::json!({"prompt": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], SHORT_PROMPT_REPLY);
    assert_eq!(body["tool_calls"], serde_json::json!([]));
    assert!(body.get("using_deepseek").is_none());
    assert!(body["request_id"].as_str().unwrap().starts_with("req_"));
}

#[tokio::test]
async fn malformed_body_is_answered_not_rejected() {
    let app = test_app("http://127.0.0.1:9", None);
    let request = Request::builder()
        .method("POST")
        .uri("/api/chat")
        .body(Body::from("this is {{ not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["response"], SHORT_PROMPT_REPLY);
}

#[tokio::test]
async fn missing_api_key_serves_fallback_with_error() {
    let app = test_app("http://127.0.0.1:9", None);
    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(serde_json::json!({"prompt": "How should a small shop think about backups?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["using_deepseek"], serde_json::json!(false));
    assert_eq!(body["error"], "DeepSeek API key not configured");
    assert!(!body["response"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_500_is_masked_with_fallback() {
    let base = spawn_upstream(
        StatusCode::INTERNAL_SERVER_ERROR,
        serde_json::json!({"error": {"message": "upstream exploded"}}),
    )
    .await;
    let app = test_app(&base, Some("sk-test"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(serde_json::json!({"prompt": "Explain zero trust for small firms"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["using_deepseek"], serde_json::json!(false));
    assert!(body["error"].as_str().unwrap().contains("upstream exploded"));
    assert!(!body["response"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn upstream_success_roundtrip_and_terminal_registry_state() {
    let base = spawn_upstream(
        StatusCode::OK,
        serde_json::json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello from DeepSeek"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }),
    )
    .await;
    let app = test_app(&base, Some("sk-test"));

    let (status, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(serde_json::json!({
            "prompt": "Explain zero trust for small firms",
            "session_id": "session-fixed"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Hello from DeepSeek");
    assert_eq!(body["session_id"], "session-fixed");
    assert_eq!(body["using_deepseek"], serde_json::json!(true));
    assert_eq!(body["tokens"], serde_json::json!(15));

    // The finished request is queryable and refuses a late cancel: no
    // pending abort can fire after completion.
    let request_id = body["request_id"].as_str().unwrap().to_string();
    let (status, view) = send(&app, "GET", &format!("/api/requests/{request_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["status"], "completed");

    let (status, cancel) = send(
        &app,
        "POST",
        "/api/cancel",
        Some(serde_json::json!({"request_id": request_id})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancel["success"], serde_json::json!(false));
}

#[tokio::test]
async fn status_endpoint_reports_configuration() {
    let app = test_app("http://127.0.0.1:9", None);
    for path in ["/", "/api"] {
        let (status, body) = send(&app, "GET", path, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Tony Tech Insights API is running");
        assert_eq!(body["deepseek_connected"], serde_json::json!(false));
        assert_eq!(body["environment"], "test");
    }
}

#[tokio::test]
async fn unknown_route_gets_json_404() {
    let app = test_app("http://127.0.0.1:9", None);
    let (status, body) = send(&app, "GET", "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Endpoint not found");
}

#[tokio::test]
async fn bare_options_request_is_accepted() {
    let app = test_app("http://127.0.0.1:9", None);
    let (status, _) = send(&app, "OPTIONS", "/anything/at/all", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn cors_preflight_succeeds_on_chat_route() {
    let app = test_app("http://127.0.0.1:9", None).layer(CorsLayer::permissive());
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/chat")
        .header("origin", "https://example.com")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn cancel_validates_its_input() {
    let app = test_app("http://127.0.0.1:9", None);

    let (_, body) = send(
        &app,
        "POST",
        "/api/cancel",
        Some(serde_json::json!({"request_id": ""})),
    )
    .await;
    assert_eq!(body["success"], serde_json::json!(false));
    assert_eq!(body["message"], "No request ID provided");

    let (_, body) = send(
        &app,
        "POST",
        "/api/cancel",
        Some(serde_json::json!({"request_id": "req_missing"})),
    )
    .await;
    assert_eq!(body["success"], serde_json::json!(false));
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("could not be cancelled"));
}

#[tokio::test]
async fn unknown_request_status_is_404() {
    let app = test_app("http://127.0.0.1:9", None);
    let (status, body) = send(&app, "GET", "/api/requests/req_missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn generated_session_ids_use_the_session_prefix() {
    let app = test_app("http://127.0.0.1:9", None);
    let (_, body) = send(
        &app,
        "POST",
        "/api/chat",
        Some(serde_json::json!({"prompt": "hi"})),
    )
    .await;
    assert!(body["session_id"].as_str().unwrap().starts_with("session-"));
}
