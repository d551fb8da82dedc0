use async_trait::async_trait;
use crate::error::Result;
use crate::settlement::ledger::TransactionRecord;
use crate::types::ids::{TransactionId, UserId, VirtualNuban};

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn find_transaction(&self, transaction_id: TransactionId) -> Result<TransactionRecord>;

    async fn transactions_for_account(&self, account: &VirtualNuban) -> Result<Vec<TransactionRecord>>;

    async fn transactions_for_user(&self, user_id: UserId) -> Result<Vec<TransactionRecord>>;
}
