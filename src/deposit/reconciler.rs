use std::future::Future;
use std::sync::Arc;
use chrono::Utc;
use tracing::Instrument;
use crate::balance::{BalanceCalculator, DepositBreakdown};
use crate::config::reconciler::ReconcilerConfig;
use crate::error::{Error, Result};
use crate::interfaces::balance_store::{BalanceStore, DepositCredit};
use crate::observability::tracing::{trace_deposit, trace_reconciliation};
use crate::provider::{DepositEvent, PaymentProvider};
use crate::settlement::account_locks::AccountLocks;
use crate::settlement::accounts::VirtualAccount;
use crate::settlement::ledger::{TransactionKind, TransactionRecord};
use crate::types::balance::Balance;
use crate::types::ids::{DepositId, VirtualNuban};
use crate::utils::helper::{
    alert_operations_team_critical, alert_operations_team_warning, generate_order_id,
    generate_session_id, generate_transaction_id,
};

#[derive(Debug)]
pub enum DepositOutcome {
    Credited(TransactionRecord),
    /// Already credited by an earlier or concurrent run.
    Skipped,
}

#[derive(Debug)]
pub struct FailedDeposit {
    pub deposit_id: DepositId,
    pub error: Error,
}

#[derive(Debug)]
pub struct ReconcileReport {
    pub account: VirtualNuban,
    pub credited: Vec<TransactionRecord>,
    pub skipped: Vec<DepositId>,
    pub failed: Vec<FailedDeposit>,
}

impl ReconcileReport {
    fn new(account: VirtualNuban) -> Self {
        ReconcileReport {
            account,
            credited: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn total_credited(&self) -> Balance {
        self.credited.iter().map(|r| r.amount).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Turns provider-reported deposits into wallet credits, exactly once per
/// deposit ID.
///
/// A fetch failure aborts the run before anything is written. After that each
/// event stands alone: a store failure on one deposit leaves it unmarked for
/// the next run and does not stop the others.
pub struct DepositReconciler {
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn BalanceStore>,
    calculator: BalanceCalculator,
    config: ReconcilerConfig,
    locks: AccountLocks,
}

impl DepositReconciler {
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        store: Arc<dyn BalanceStore>,
        calculator: BalanceCalculator,
        config: ReconcilerConfig,
    ) -> Self {
        DepositReconciler {
            provider,
            store,
            calculator,
            config,
            locks: AccountLocks::new(),
        }
    }

    /// Credits every deposit the provider reports for `account` that has not
    /// been credited yet. Safe to call repeatedly and concurrently.
    pub async fn reconcile(&self, account: &VirtualNuban) -> Result<ReconcileReport> {
        self.reconcile_inner(account)
            .instrument(trace_reconciliation(account))
            .await
    }

    async fn reconcile_inner(&self, account: &VirtualNuban) -> Result<ReconcileReport> {
        let _lock = if self.config.serialize_per_account {
            Some(self.locks.acquire(account, self.config.lock_timeout()).await?)
        } else {
            None
        };

        let events = self.fetch_deposits(account).await?;
        let mut report = ReconcileReport::new(account.clone());

        for event in &events {
            if &event.account != account {
                tracing::warn!(
                    account = %account,
                    event_account = %event.account,
                    deposit_id = %event.id,
                    "Provider returned a deposit for another account, ignoring"
                );
                continue;
            }

            let outcome = self.process_event(account, event)
                .instrument(trace_deposit(account, &event.id))
                .await;

            match outcome {
                Ok(DepositOutcome::Credited(record)) => report.credited.push(record),
                Ok(DepositOutcome::Skipped) => report.skipped.push(event.id.clone()),
                Err(error) => {
                    tracing::warn!(
                        account = %account,
                        deposit_id = %event.id,
                        error = %error,
                        "Deposit not credited, will retry next run"
                    );
                    report.failed.push(FailedDeposit {
                        deposit_id: event.id.clone(),
                        error,
                    });
                }
            }
        }

        tracing::info!(
            account = %account,
            fetched = events.len(),
            credited = report.credited.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            total_credited = %report.total_credited(),
            "Reconciliation run finished"
        );
        Ok(report)
    }

    async fn fetch_deposits(&self, account: &VirtualNuban) -> Result<Vec<DepositEvent>> {
        let timeout = self.config.provider_timeout();
        let fetched = tokio::time::timeout(timeout, self.provider.list_deposits(account))
            .await
            .map_err(|_| Error::ProviderUnavailable {
                account: account.clone(),
                reason: format!("timed out after {:?}", timeout),
            })?;

        match fetched {
            Ok(events) => Ok(events),
            Err(error @ Error::MalformedProviderResponse { .. }) => {
                alert_operations_team_critical(format!("Deposit feed unreadable: {}", error));
                Err(error)
            }
            Err(error) => {
                tracing::error!(account = %account, error = %error, "Failed to fetch deposits");
                Err(error)
            }
        }
    }

    /// Applies a single deposit. The only write is the conditional
    /// `mark_processed_and_credit`, so an error or a dropped future leaves the
    /// account exactly as it was.
    async fn process_event(&self, account: &VirtualNuban, event: &DepositEvent) -> Result<DepositOutcome> {
        if event.amount.is_zero() || event.amount.is_sign_negative() {
            return Err(Error::InvalidAmount(Balance::from_decimal(event.amount)));
        }

        let mut attempt = 0;
        loop {
            let processed = self
                .store_call("has_processed_deposit", event, self.store.has_processed_deposit(account, &event.id))
                .await?;
            if processed {
                tracing::debug!(account = %account, deposit_id = %event.id, "Deposit already credited, skipping");
                return Ok(DepositOutcome::Skipped);
            }

            let current = self
                .store_call("get_account", event, self.store.get_account(account))
                .await?;
            let breakdown = self.calculator.compute_deposit(current.balance, event.amount);
            let record = self.deposit_record(account, event, &current, &breakdown);

            let credit = DepositCredit {
                account: account.clone(),
                deposit_id: event.id.clone(),
                previous_balance: current.balance,
                new_balance: breakdown.new_balance,
                record: record.clone(),
            };

            let written = self
                .store_call("mark_processed_and_credit", event, self.store.mark_processed_and_credit(credit))
                .await;

            match written {
                Ok(()) => {
                    tracing::info!(
                        account = %account,
                        deposit_id = %event.id,
                        transaction_id = %record.transaction_id,
                        gross = %event.amount,
                        net = %breakdown.net_credited,
                        balance_after = %breakdown.new_balance,
                        "Deposit credited"
                    );
                    return Ok(DepositOutcome::Credited(record));
                }
                Err(Error::DepositAlreadyProcessed { .. }) => {
                    tracing::debug!(account = %account, deposit_id = %event.id, "Deposit credited concurrently, skipping");
                    return Ok(DepositOutcome::Skipped);
                }
                Err(Error::BalanceConflict { .. }) if attempt < self.config.max_conflict_retries => {
                    attempt += 1;
                    tracing::debug!(account = %account, deposit_id = %event.id, attempt, "Balance moved, retrying credit");
                }
                Err(Error::BalanceConflict { expected, actual, .. }) => {
                    alert_operations_team_warning(format!(
                        "Deposit {} on {} gave up after {} balance conflicts",
                        event.id, account, attempt
                    ));
                    return Err(Error::PersistenceFailure {
                        account: account.clone(),
                        deposit_id: Some(event.id.clone()),
                        operation: "mark_processed_and_credit",
                        reason: format!("balance kept moving: expected={}, actual={}", expected, actual),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }

    fn deposit_record(
        &self,
        account: &VirtualNuban,
        event: &DepositEvent,
        document: &VirtualAccount,
        breakdown: &DepositBreakdown,
    ) -> TransactionRecord {
        let sender = event.counter_party.account_name.as_deref().unwrap_or("unknown sender");
        let description = match &event.counter_party.bank_name {
            Some(bank) => format!("Deposit of {} from {} ({})", breakdown.net_credited, sender, bank),
            None => format!("Deposit of {} from {}", breakdown.net_credited, sender),
        };

        TransactionRecord {
            transaction_id: generate_transaction_id(),
            order_id: generate_order_id(),
            session_id: event.payment_reference.clone().unwrap_or_else(generate_session_id),
            account: account.clone(),
            user_id: document.user_id,
            kind: TransactionKind::Deposit,
            amount: breakdown.net_credited,
            fee: breakdown.deduction,
            balance_after: breakdown.new_balance,
            description,
            counter_party: Some(event.counter_party.clone()),
            deposit_id: Some(event.id.clone()),
            created_at: Utc::now(),
        }
    }

    /// Bounds a store call by the configured timeout. A timeout becomes a
    /// `PersistenceFailure` for this event.
    async fn store_call<T, F>(&self, operation: &'static str, event: &DepositEvent, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.config.store_timeout();
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::PersistenceFailure {
                account: event.account.clone(),
                deposit_id: Some(event.id.clone()),
                operation,
                reason: format!("timed out after {:?}", timeout),
            }),
        }
    }
}
