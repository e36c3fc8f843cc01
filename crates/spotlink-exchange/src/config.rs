use std::time::Duration;

use serde::Deserialize;

/// Settings for the HTTP client used against a join code service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Per-request timeout in milliseconds. Default: 5000.
    pub request_timeout_ms: u64,

    /// `User-Agent` header sent to the service.
    pub user_agent: String,
}

impl ExchangeConfig {
    /// The request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 5_000,
            user_agent: concat!("spotlink/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
