use crate::chat::registry::ActiveRequests;
use crate::chat::upstream::DeepSeekClient;
use crate::config::GatewayConfig;

/// Shared application state, one instance behind an `Arc` for the whole
/// server. Requests are independent; nothing here is request-scoped.
pub struct AppState {
    pub config: GatewayConfig,
    pub deepseek: DeepSeekClient,
    pub requests: ActiveRequests,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Self {
        let deepseek = DeepSeekClient::new(&config);
        Self {
            config,
            deepseek,
            requests: ActiveRequests::new(),
        }
    }
}
