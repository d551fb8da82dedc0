use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::error::{Error, Result};
use crate::types::ids::{DepositId, VirtualNuban};

const DEFAULT_FILTER: &str = "info,wallet_infra=debug";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| Error::ConfigError(format!("tracing subscriber: {}", e)))
}

pub fn trace_reconciliation(account: &VirtualNuban) -> Span {
    tracing::info_span!(
        "reconciliation",
        account = %account,
    )
}

pub fn trace_deposit(account: &VirtualNuban, deposit_id: &DepositId) -> Span {
    tracing::debug_span!(
        "deposit",
        account = %account,
        deposit_id = %deposit_id,
    )
}
