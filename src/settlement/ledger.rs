use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::types::balance::Balance;
use crate::types::ids::{DepositId, OrderId, TransactionId, UserId, VirtualNuban};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterParty {
    pub bank_name: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Deposit,
    Transfer,
    Payment,
    Adjustment,
}

/// A completed balance movement. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: TransactionId,
    pub order_id: OrderId,
    pub session_id: String,
    pub account: VirtualNuban,
    pub user_id: UserId,
    pub kind: TransactionKind,
    /// Net amount credited, or principal debited. Always non-negative
    /// except for downward adjustments.
    pub amount: Balance,
    pub fee: Balance,
    pub balance_after: Balance,
    pub description: String,
    pub counter_party: Option<CounterParty>,
    pub deposit_id: Option<DepositId>,
    pub created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Effect of this record on the account balance.
    pub fn signed_amount(&self) -> Balance {
        match self.kind {
            TransactionKind::Deposit | TransactionKind::Adjustment => self.amount,
            TransactionKind::Transfer | TransactionKind::Payment => -(self.amount + self.fee),
        }
    }
}

/// Append-only transaction log of one account.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ledger {
    entries: Vec<TransactionRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            entries: Vec::new(),
        }
    }

    pub fn record_entry(&mut self, entry: TransactionRecord) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[TransactionRecord] {
        &self.entries
    }

    pub fn find(&self, transaction_id: TransactionId) -> Option<&TransactionRecord> {
        self.entries.iter().find(|e| e.transaction_id == transaction_id)
    }

    pub fn deposits(&self) -> impl Iterator<Item = &TransactionRecord> {
        self.entries.iter().filter(|e| e.kind == TransactionKind::Deposit)
    }

    pub fn net_total(&self) -> Balance {
        self.entries.iter().map(TransactionRecord::signed_amount).sum()
    }

    pub fn verify_balance(&self, expected: Balance) -> bool {
        self.net_total() == expected
    }
}
