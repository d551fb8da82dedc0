use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use crate::settlement::ledger::{Ledger, TransactionRecord};
use crate::types::balance::Balance;
use crate::types::ids::{DepositId, UserId, VirtualNuban};

/// One virtual account document: balance, the deposit IDs already credited
/// to it and its transaction log. All three change together or not at all.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VirtualAccount {
    pub virtual_nuban: VirtualNuban,
    pub user_id: UserId,
    pub balance: Balance,
    pub processed_deposit_ids: HashSet<DepositId>,
    pub ledger: Ledger,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VirtualAccount {
    pub fn new(virtual_nuban: VirtualNuban, user_id: UserId) -> Self {
        let now = Utc::now();
        VirtualAccount {
            virtual_nuban,
            user_id,
            balance: Balance::zero(),
            processed_deposit_ids: HashSet::new(),
            ledger: Ledger::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_processed(&self, deposit_id: &DepositId) -> bool {
        self.processed_deposit_ids.contains(deposit_id)
    }

    /// Moves the balance and appends the record. Preconditions are checked
    /// by the store before calling this.
    pub(crate) fn apply(&mut self, new_balance: Balance, record: TransactionRecord) {
        if let Some(deposit_id) = &record.deposit_id {
            self.processed_deposit_ids.insert(deposit_id.clone());
        }
        self.balance = new_balance;
        self.updated_at = Utc::now();
        self.ledger.record_entry(record);
    }
}
