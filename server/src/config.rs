//! Gateway configuration.
//!
//! Built once in `main` from CLI/env arguments and handed to the router
//! state; nothing reads the process environment after startup.

use std::time::Duration;

/// Safety buffer between our upstream deadline and the platform's own
/// execution ceiling, so the abort always fires before the platform kills
/// the handler.
pub const CEILING_BUFFER: Duration = Duration::from_millis(1500);

/// Fixed delay before the single retry attempt.
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Total attempts against the upstream API (1 initial + 1 retry).
pub const MAX_ATTEMPTS: u32 = 2;

/// Keys the original deployment used as "not really configured".
const PLACEHOLDER_KEYS: [&str; 3] = ["your_api_key_here", "none", "test"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid DeepSeek base URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("platform ceiling {millis}ms is too low, need at least 2000ms")]
    CeilingTooLow { millis: u64 },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    /// Execution ceiling imposed by the hosting platform.
    pub platform_ceiling: Duration,
    pub environment: String,
}

impl GatewayConfig {
    pub fn new(
        api_key: Option<String>,
        api_base: String,
        model: String,
        platform_ceiling_ms: u64,
        environment: String,
    ) -> Result<Self, ConfigError> {
        url::Url::parse(&api_base).map_err(|source| ConfigError::InvalidBaseUrl {
            url: api_base.clone(),
            source,
        })?;

        if platform_ceiling_ms < 2000 {
            return Err(ConfigError::CeilingTooLow {
                millis: platform_ceiling_ms,
            });
        }

        Ok(Self {
            api_key: api_key.and_then(normalize_key),
            api_base,
            model,
            platform_ceiling: Duration::from_millis(platform_ceiling_ms),
            environment,
        })
    }

    pub fn deepseek_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Total time budget for the upstream call, retries included.
    ///
    /// Strictly below `platform_ceiling`: the config constructor rejects
    /// ceilings under 2s, so the subtraction never reaches zero.
    pub fn upstream_budget(&self) -> Duration {
        self.platform_ceiling - CEILING_BUFFER
    }
}

fn normalize_key(key: String) -> Option<String> {
    let trimmed = key.trim();
    if trimmed.is_empty() || PLACEHOLDER_KEYS.contains(&trimmed.to_lowercase().as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}
