use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use crate::balance::BalanceCalculator;
use crate::error::{Error, Result};
use crate::interfaces::balance_store::{BalanceDebit, BalanceStore};
use crate::settlement::ledger::{CounterParty, TransactionKind, TransactionRecord};
use crate::types::balance::Balance;
use crate::types::ids::VirtualNuban;
use crate::utils::helper::{generate_order_id, generate_session_id, generate_transaction_id};

/// Transfer and payment debits against a wallet balance.
pub struct DebitService {
    store: Arc<dyn BalanceStore>,
    calculator: BalanceCalculator,
    max_conflict_retries: u32,
    store_timeout: Duration,
}

impl DebitService {
    pub fn new(
        store: Arc<dyn BalanceStore>,
        calculator: BalanceCalculator,
        max_conflict_retries: u32,
        store_timeout: Duration,
    ) -> Self {
        DebitService {
            store,
            calculator,
            max_conflict_retries,
            store_timeout,
        }
    }

    /// Sends `amount` to a counter-party. The flat transfer fee is charged on top.
    pub async fn transfer(
        &self,
        account: &VirtualNuban,
        amount: Balance,
        counter_party: CounterParty,
        narration: &str,
    ) -> Result<TransactionRecord> {
        Self::check_amount(amount)?;
        let fee = self.calculator.transfer_fee();

        self.debit_with_retry(account, |balance| {
            self.calculator.can_afford_transfer(balance, amount)?;
            Ok(DebitPlan {
                kind: TransactionKind::Transfer,
                amount,
                fee,
                new_balance: self.calculator.compute_transfer_debit(balance, amount),
                description: format!("Transfer: {}", narration),
                counter_party: Some(counter_party.clone()),
            })
        })
        .await
    }

    /// Pays a bill or top-up from the wallet. No fee.
    pub async fn pay(&self, account: &VirtualNuban, amount: Balance, description: &str) -> Result<TransactionRecord> {
        Self::check_amount(amount)?;

        self.debit_with_retry(account, |balance| {
            self.calculator.can_afford_payment(balance, amount)?;
            Ok(DebitPlan {
                kind: TransactionKind::Payment,
                amount,
                fee: Balance::zero(),
                new_balance: self.calculator.compute_payment_debit(balance, amount),
                description: description.to_string(),
                counter_party: None,
            })
        })
        .await
    }

    fn check_amount(amount: Balance) -> Result<()> {
        if !amount.is_positive() {
            return Err(Error::InvalidAmount(amount));
        }
        Ok(())
    }

    async fn debit_with_retry<F>(&self, account: &VirtualNuban, plan: F) -> Result<TransactionRecord>
    where
        F: Fn(Balance) -> Result<DebitPlan>,
    {
        let mut attempt = 0;
        loop {
            let current = self
                .store_call(account, "get_account", self.store.get_account(account))
                .await?;
            let plan = plan(current.balance)?;

            let record = TransactionRecord {
                transaction_id: generate_transaction_id(),
                order_id: generate_order_id(),
                session_id: generate_session_id(),
                account: account.clone(),
                user_id: current.user_id,
                kind: plan.kind,
                amount: plan.amount,
                fee: plan.fee,
                balance_after: plan.new_balance,
                description: plan.description,
                counter_party: plan.counter_party,
                deposit_id: None,
                created_at: Utc::now(),
            };

            let debit = BalanceDebit {
                account: account.clone(),
                previous_balance: current.balance,
                new_balance: plan.new_balance,
                record: record.clone(),
            };

            match self.store_call(account, "apply_debit", self.store.apply_debit(debit)).await {
                Ok(()) => {
                    tracing::info!(
                        account = %account,
                        transaction_id = %record.transaction_id,
                        kind = ?record.kind,
                        amount = %record.amount,
                        balance_after = %record.balance_after,
                        "Debit applied"
                    );
                    return Ok(record);
                }
                Err(Error::BalanceConflict { .. }) if attempt < self.max_conflict_retries => {
                    attempt += 1;
                    tracing::debug!(account = %account, attempt, "Balance moved during debit, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Bounds a store call by the store timeout.
    async fn store_call<T, F>(&self, account: &VirtualNuban, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(Error::PersistenceFailure {
                account: account.clone(),
                deposit_id: None,
                operation,
                reason: format!("timed out after {:?}", self.store_timeout),
            }),
        }
    }
}

struct DebitPlan {
    kind: TransactionKind,
    amount: Balance,
    fee: Balance,
    new_balance: Balance,
    description: String,
    counter_party: Option<CounterParty>,
}
