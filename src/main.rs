use std::sync::Arc;
use std::time::Duration;
use anyhow::Context;
use tokio::sync::watch;
use wallet_infra::config::AppConfig;
use wallet_infra::interfaces::BalanceStore;
use wallet_infra::observability::tracing::init_tracing;
use wallet_infra::utils::task_supervisor::TaskSupervisor;
use wallet_infra::{
    BalanceCalculator, DepositReconciler, HttpPaymentProvider, InMemoryStore,
    ReconciliationScheduler, UserId, VirtualNuban,
};

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json_logs = std::env::var("WALLET_INFRA_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    init_tracing(json_logs)?;

    let config = AppConfig::load_from_env().context("loading configuration")?;

    let provider = Arc::new(HttpPaymentProvider::new(config.provider.clone())?);
    let store = Arc::new(InMemoryStore::new());
    let calculator = BalanceCalculator::new(config.fees.clone())?;

    let accounts: Vec<VirtualNuban> = config.reconciler.accounts
        .iter()
        .map(|a| VirtualNuban::from(a.as_str()))
        .collect();
    // Accounts are provisioned elsewhere in production; the in-memory store
    // starts empty, so open each polled account here.
    for account in &accounts {
        store.create_account(account.clone(), UserId::new()).await?;
    }

    let reconciler = Arc::new(DepositReconciler::new(
        provider,
        store,
        calculator,
        config.reconciler.clone(),
    ));
    let scheduler = ReconciliationScheduler::new(
        reconciler,
        accounts,
        config.reconciler.poll_interval(),
    )?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut supervisor = TaskSupervisor::new();
    supervisor.spawn("deposit_reconciliation", scheduler.run(shutdown_rx));

    let mut health = tokio::time::interval(HEALTH_CHECK_INTERVAL);
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for ctrl-c")?;
                tracing::info!("Shutdown requested");
                break;
            }
            _ = health.tick() => {
                supervisor.check_health()?;
            }
        }
    }

    let _ = shutdown_tx.send(true);
    supervisor.wait_for_task("deposit_reconciliation").await?;
    Ok(())
}
