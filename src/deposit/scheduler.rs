use std::sync::Arc;
use std::time::Duration;
use futures::future::join_all;
use tokio::sync::watch;
use crate::deposit::reconciler::{DepositReconciler, ReconcileReport};
use crate::error::{Error, Result};
use crate::types::ids::VirtualNuban;

/// Periodically reconciles a fixed set of accounts. Accounts run in
/// parallel; a failed run is logged and picked up again on the next tick.
pub struct ReconciliationScheduler {
    reconciler: Arc<DepositReconciler>,
    accounts: Vec<VirtualNuban>,
    interval: Duration,
}

impl ReconciliationScheduler {
    pub fn new(reconciler: Arc<DepositReconciler>, accounts: Vec<VirtualNuban>, interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::ConfigError("poll interval must be non-zero".to_string()));
        }
        Ok(ReconciliationScheduler {
            reconciler,
            accounts,
            interval,
        })
    }

    /// One reconciliation pass over every account.
    pub async fn run_once(&self) -> Vec<(VirtualNuban, Result<ReconcileReport>)> {
        let runs = self.accounts.iter().map(|account| async move {
            (account.clone(), self.reconciler.reconcile(account).await)
        });
        join_all(runs).await
    }

    /// Ticks until `shutdown` turns true or its sender is dropped. A pass in
    /// progress is always allowed to finish.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(
            accounts = self.accounts.len(),
            interval = ?self.interval,
            "Reconciliation scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for (account, result) in self.run_once().await {
                        Self::log_result(&account, &result);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Reconciliation scheduler stopping");
                        return Ok(());
                    }
                }
            }
        }
    }

    fn log_result(account: &VirtualNuban, result: &Result<ReconcileReport>) {
        match result {
            Ok(report) if !report.is_clean() => {
                tracing::warn!(
                    account = %account,
                    failed = report.failed.len(),
                    "Reconciliation finished with failed deposits"
                );
            }
            Ok(_) => {}
            Err(error) => {
                tracing::error!(
                    account = %account,
                    error = %error,
                    retryable = error.is_retryable(),
                    "Reconciliation run failed"
                );
            }
        }
    }
}
