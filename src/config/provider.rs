use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_key_header: String,
    pub request_timeout_ms: u64,
}

impl ProviderConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: "http://localhost:8080".to_string(),
            api_key: String::new(),
            api_key_header: "x-api-key".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}
