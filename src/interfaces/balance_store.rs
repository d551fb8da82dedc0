use async_trait::async_trait;
use crate::error::Result;
use crate::settlement::accounts::VirtualAccount;
use crate::settlement::ledger::TransactionRecord;
use crate::types::balance::Balance;
use crate::types::ids::{DepositId, UserId, VirtualNuban};

/// Everything needed to credit one deposit in a single conditional write.
#[derive(Clone, Debug)]
pub struct DepositCredit {
    pub account: VirtualNuban,
    pub deposit_id: DepositId,
    /// The balance the credit was computed from. The write is rejected if
    /// the stored balance has moved since.
    pub previous_balance: Balance,
    pub new_balance: Balance,
    pub record: TransactionRecord,
}

/// A transfer or payment debit, conditional on `previous_balance`.
#[derive(Clone, Debug)]
pub struct BalanceDebit {
    pub account: VirtualNuban,
    pub previous_balance: Balance,
    pub new_balance: Balance,
    pub record: TransactionRecord,
}

#[async_trait]
pub trait BalanceStore: Send + Sync {
    async fn create_account(&self, account: VirtualNuban, user_id: UserId) -> Result<VirtualAccount>;

    async fn get_account(&self, account: &VirtualNuban) -> Result<VirtualAccount>;

    async fn get_balance(&self, account: &VirtualNuban) -> Result<Balance>;

    /// Administrative overwrite. Recorded in the ledger as an adjustment.
    async fn set_balance(&self, account: &VirtualNuban, amount: Balance) -> Result<()>;

    async fn has_processed_deposit(&self, account: &VirtualNuban, deposit_id: &DepositId) -> Result<bool>;

    /// Writes the new balance, marks the deposit processed and appends the
    /// record, all or nothing.
    ///
    /// Fails with `DepositAlreadyProcessed` if the deposit ID is already in
    /// the processed set and `BalanceConflict` if the balance is no longer
    /// `previous_balance`.
    async fn mark_processed_and_credit(&self, credit: DepositCredit) -> Result<()>;

    async fn apply_debit(&self, debit: BalanceDebit) -> Result<()>;
}
