//! DeepSeek completion client.
//!
//! One total time budget covers the initial attempt, the retry delay, and
//! the retry itself, so the call always aborts before the platform's own
//! execution ceiling kills the handler.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::config::{GatewayConfig, MAX_ATTEMPTS, RETRY_DELAY};

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("DeepSeek API key not configured")]
    Unconfigured,
    #[error("DeepSeek request timed out")]
    Timeout,
    #[error("DeepSeek API error: {message} (status {status})")]
    Status { status: u16, message: String },
    #[error("network error calling DeepSeek: {0}")]
    Network(String),
    #[error("could not decode DeepSeek response: {0}")]
    Decode(String),
}

impl UpstreamError {
    fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Timeout | UpstreamError::Network(_) => true,
            UpstreamError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

/// Successful completion, reduced to what the handler needs.
#[derive(Debug)]
pub struct Completion {
    pub content: String,
    pub total_tokens: Option<u32>,
}

pub struct DeepSeekClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    budget: Duration,
}

impl DeepSeekClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            budget: config.upstream_budget(),
        }
    }

    /// Run a completion under the gateway's deadline budget, retrying once
    /// on a retryable failure if budget remains.
    pub async fn complete(
        &self,
        system_prompt: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<Completion, UpstreamError> {
        let api_key = self.api_key.as_deref().ok_or(UpstreamError::Unconfigured)?;

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![Message::system(system_prompt), Message::user(prompt)],
            temperature: 0.7,
            max_tokens,
        };

        let deadline = Instant::now() + self.budget;
        let mut attempt = 0;
        loop {
            attempt += 1;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(UpstreamError::Timeout);
            }

            match self.attempt(api_key, &request, remaining).await {
                Ok(completion) => return Ok(completion),
                Err(e) if attempt < MAX_ATTEMPTS && e.is_retryable() => {
                    tracing::warn!(
                        "DeepSeek attempt {}/{} failed: {}, retrying in {:?}",
                        attempt,
                        MAX_ATTEMPTS,
                        e,
                        RETRY_DELAY
                    );
                    tokio::time::sleep(RETRY_DELAY.min(remaining)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(
        &self,
        api_key: &str,
        request: &CompletionRequest,
        timeout: Duration,
    ) -> Result<Completion, UpstreamError> {
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body, status.as_u16()),
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Decode(e.to_string()))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::Decode("response contained no choices".into()))?;

        Ok(Completion {
            content: choice.message.content,
            total_tokens: completion.usage.map(|u| u.total_tokens),
        })
    }
}

fn classify_send_error(error: reqwest::Error) -> UpstreamError {
    if error.is_timeout() {
        UpstreamError::Timeout
    } else if error.is_connect() {
        UpstreamError::Network(format!("connection failed: {error}"))
    } else {
        UpstreamError::Network(error.to_string())
    }
}

/// Upstream error bodies are JSON when the API itself answers and plain
/// text when a proxy in front of it does; accept both.
fn extract_error_message(body: &str, status: u16) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = json
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return message.to_string();
        }
    }
    format!("Status {}: {}", status, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_message_from_json_error_body() {
        let body = r#"{"error": {"message": "Insufficient Balance", "type": "invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body, 402), "Insufficient Balance");
    }

    #[test]
    fn falls_back_to_raw_body_for_non_json() {
        assert_eq!(
            extract_error_message("upstream exploded", 502),
            "Status 502: upstream exploded"
        );
    }

    #[test]
    fn retryable_classification() {
        assert!(UpstreamError::Timeout.is_retryable());
        assert!(UpstreamError::Network("connection refused".into()).is_retryable());
        assert!(UpstreamError::Status {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(UpstreamError::Status {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!UpstreamError::Status {
            status: 401,
            message: String::new()
        }
        .is_retryable());
        assert!(!UpstreamError::Unconfigured.is_retryable());
    }
}
