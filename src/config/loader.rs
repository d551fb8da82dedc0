use crate::config::fees::FeeConfig;
use crate::config::provider::ProviderConfig;
use crate::config::reconciler::ReconcilerConfig;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const ENV_VAR: &str = "WALLET_INFRA_ENV";
const ENV_PREFIX: &str = "WALLET_INFRA";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub fees: FeeConfig,
    pub reconciler: ReconcilerConfig,
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("reconciler.accounts")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config.try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Loads the environment named by `WALLET_INFRA_ENV`, `development` when unset.
    pub fn load_from_env() -> Result<Self> {
        let env = std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_string());
        Self::load(&env)
    }
}
