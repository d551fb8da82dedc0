use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    pub store_timeout_ms: u64,
    pub provider_timeout_ms: u64,
    pub lock_timeout_ms: u64,
    pub serialize_per_account: bool,
    pub max_conflict_retries: u32,
    pub poll_interval_secs: u64,
    /// Virtual accounts the scheduler polls, as `virtual_nuban` strings.
    pub accounts: Vec<String>,
}

impl ReconcilerConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            store_timeout_ms: 10_000,
            provider_timeout_ms: 10_000,
            lock_timeout_ms: 30_000,
            serialize_per_account: true,
            max_conflict_retries: 3,
            poll_interval_secs: 60,
            accounts: Vec::new(),
        }
    }
}
