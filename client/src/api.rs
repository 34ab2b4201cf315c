//! Typed client for the gateway's HTTP surface.
//!
//! The wire structs are re-declared here rather than shared with the
//! server crate; the client only depends on the published JSON shape.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub request_id: String,
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
    #[serde(default)]
    pub using_deepseek: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub elapsed_ms: Option<u64>,
    #[serde(default)]
    pub tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct CancelRequest<'a> {
    request_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CancelResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
    pub deepseek_connected: bool,
    pub version: String,
}

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    session_id: Option<String>,
}

impl ApiClient {
    /// The transport timeout sits slightly above the flow's abort budget so
    /// the state machine, not reqwest, decides when a request timed out.
    pub fn new(base: &str, abort_after: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(abort_after + Duration::from_secs(2))
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            base: base.trim_end_matches('/').to_string(),
            session_id: None,
        })
    }

    /// Send a prompt, echoing whatever session token the server handed out
    /// on the previous turn.
    pub async fn chat(&mut self, prompt: &str) -> anyhow::Result<ChatResponse> {
        let request = ChatRequest {
            prompt,
            session_id: self.session_id.as_deref(),
        };
        let response = self
            .http
            .post(format!("{}/api/chat", self.base))
            .json(&request)
            .send()
            .await
            .context("sending chat request")?
            .error_for_status()
            .context("chat request rejected")?;

        let reply: ChatResponse = response.json().await.context("decoding chat response")?;
        self.session_id = Some(reply.session_id.clone());
        Ok(reply)
    }

    pub async fn status(&self) -> anyhow::Result<StatusResponse> {
        let response = self
            .http
            .get(format!("{}/api", self.base))
            .send()
            .await
            .context("reaching the gateway")?
            .error_for_status()
            .context("status request rejected")?;
        response.json().await.context("decoding status response")
    }

    pub async fn cancel(&self, request_id: &str) -> anyhow::Result<CancelResponse> {
        let response = self
            .http
            .post(format!("{}/api/cancel", self.base))
            .json(&CancelRequest { request_id })
            .send()
            .await
            .context("sending cancel request")?
            .error_for_status()
            .context("cancel request rejected")?;
        response.json().await.context("decoding cancel response")
    }
}
