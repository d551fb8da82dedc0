use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use crate::error::{Error, Result};
use crate::interfaces::balance_store::{BalanceDebit, BalanceStore, DepositCredit};
use crate::interfaces::transaction_store::TransactionStore;
use crate::settlement::accounts::VirtualAccount;
use crate::settlement::ledger::{TransactionKind, TransactionRecord};
use crate::types::balance::Balance;
use crate::types::ids::{DepositId, TransactionId, UserId, VirtualNuban};
use crate::utils::helper::{generate_order_id, generate_session_id, generate_transaction_id};

/// Document store backing both [`BalanceStore`] and [`TransactionStore`].
///
/// Each virtual account is one document (balance, processed deposit IDs,
/// transaction log) in a `DashMap` entry. Conditional writes run while holding
/// that entry's guard, so a credit or debit is atomic against any other writer
/// on the same account.
#[derive(Default)]
pub struct InMemoryStore {
    accounts: DashMap<VirtualNuban, VirtualAccount>,
    transaction_index: DashMap<TransactionId, VirtualNuban>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            accounts: DashMap::new(),
            transaction_index: DashMap::new(),
        }
    }

    fn check_record(account: &VirtualAccount, previous: Balance, new: Balance, record: &TransactionRecord) -> Result<()> {
        if record.account != account.virtual_nuban {
            return Err(Error::InvariantViolation(format!(
                "record {} belongs to {}, not {}",
                record.transaction_id, record.account, account.virtual_nuban
            )));
        }
        if record.balance_after != new || new - previous != record.signed_amount() {
            return Err(Error::InvariantViolation(format!(
                "record {} does not explain balance move {} -> {}",
                record.transaction_id, previous, new
            )));
        }
        Ok(())
    }

    fn check_previous_balance(account: &VirtualAccount, expected: Balance) -> Result<()> {
        if account.balance != expected {
            return Err(Error::BalanceConflict {
                account: account.virtual_nuban.clone(),
                expected,
                actual: account.balance,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BalanceStore for InMemoryStore {
    async fn create_account(&self, account: VirtualNuban, user_id: UserId) -> Result<VirtualAccount> {
        match self.accounts.entry(account.clone()) {
            Entry::Occupied(_) => Err(Error::AccountAlreadyExists(account)),
            Entry::Vacant(slot) => {
                let document = VirtualAccount::new(account, user_id);
                slot.insert(document.clone());
                tracing::info!(account = %document.virtual_nuban, user_id = %user_id, "Virtual account created");
                Ok(document)
            }
        }
    }

    async fn get_account(&self, account: &VirtualNuban) -> Result<VirtualAccount> {
        self.accounts.get(account)
            .map(|doc| doc.clone())
            .ok_or_else(|| Error::AccountNotFound(account.clone()))
    }

    async fn get_balance(&self, account: &VirtualNuban) -> Result<Balance> {
        self.accounts.get(account)
            .map(|doc| doc.balance)
            .ok_or_else(|| Error::AccountNotFound(account.clone()))
    }

    async fn set_balance(&self, account: &VirtualNuban, amount: Balance) -> Result<()> {
        let mut doc = self.accounts.get_mut(account)
            .ok_or_else(|| Error::AccountNotFound(account.clone()))?;

        let previous = doc.balance;
        let record = TransactionRecord {
            transaction_id: generate_transaction_id(),
            order_id: generate_order_id(),
            session_id: generate_session_id(),
            account: account.clone(),
            user_id: doc.user_id,
            kind: TransactionKind::Adjustment,
            amount: amount - previous,
            fee: Balance::zero(),
            balance_after: amount,
            description: format!("Balance adjusted from {} to {}", previous, amount),
            counter_party: None,
            deposit_id: None,
            created_at: Utc::now(),
        };

        let transaction_id = record.transaction_id;
        doc.apply(amount, record);
        self.transaction_index.insert(transaction_id, account.clone());

        tracing::warn!(account = %account, %previous, new = %amount, "Balance set administratively");
        Ok(())
    }

    async fn has_processed_deposit(&self, account: &VirtualNuban, deposit_id: &DepositId) -> Result<bool> {
        self.accounts.get(account)
            .map(|doc| doc.has_processed(deposit_id))
            .ok_or_else(|| Error::AccountNotFound(account.clone()))
    }

    async fn mark_processed_and_credit(&self, credit: DepositCredit) -> Result<()> {
        let mut doc = self.accounts.get_mut(&credit.account)
            .ok_or_else(|| Error::AccountNotFound(credit.account.clone()))?;

        if doc.has_processed(&credit.deposit_id) {
            return Err(Error::DepositAlreadyProcessed {
                account: credit.account,
                deposit_id: credit.deposit_id,
            });
        }
        Self::check_previous_balance(&doc, credit.previous_balance)?;
        if credit.record.kind != TransactionKind::Deposit
            || credit.record.deposit_id.as_ref() != Some(&credit.deposit_id)
        {
            return Err(Error::InvariantViolation(format!(
                "credit for deposit {} carries a non-matching record",
                credit.deposit_id
            )));
        }
        Self::check_record(&doc, credit.previous_balance, credit.new_balance, &credit.record)?;

        let transaction_id = credit.record.transaction_id;
        doc.apply(credit.new_balance, credit.record);
        self.transaction_index.insert(transaction_id, credit.account);
        Ok(())
    }

    async fn apply_debit(&self, debit: BalanceDebit) -> Result<()> {
        let mut doc = self.accounts.get_mut(&debit.account)
            .ok_or_else(|| Error::AccountNotFound(debit.account.clone()))?;

        Self::check_previous_balance(&doc, debit.previous_balance)?;
        if !matches!(debit.record.kind, TransactionKind::Transfer | TransactionKind::Payment) {
            return Err(Error::InvariantViolation(format!(
                "debit {} is not a transfer or payment",
                debit.record.transaction_id
            )));
        }
        if debit.new_balance.is_negative() {
            return Err(Error::InsufficientBalance {
                required: debit.previous_balance - debit.new_balance,
                available: debit.previous_balance,
            });
        }
        Self::check_record(&doc, debit.previous_balance, debit.new_balance, &debit.record)?;

        let transaction_id = debit.record.transaction_id;
        doc.apply(debit.new_balance, debit.record);
        self.transaction_index.insert(transaction_id, debit.account);
        Ok(())
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn find_transaction(&self, transaction_id: TransactionId) -> Result<TransactionRecord> {
        let account = self.transaction_index.get(&transaction_id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::TransactionNotFound(transaction_id))?;

        self.accounts.get(&account)
            .and_then(|doc| doc.ledger.find(transaction_id).cloned())
            .ok_or(Error::TransactionNotFound(transaction_id))
    }

    async fn transactions_for_account(&self, account: &VirtualNuban) -> Result<Vec<TransactionRecord>> {
        self.accounts.get(account)
            .map(|doc| doc.ledger.entries().to_vec())
            .ok_or_else(|| Error::AccountNotFound(account.clone()))
    }

    async fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<TransactionRecord>> {
        let mut records: Vec<TransactionRecord> = self.accounts.iter()
            .filter(|doc| doc.user_id == user_id)
            .flat_map(|doc| doc.ledger.entries().to_vec())
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
