use thiserror::Error;
use crate::types::balance::Balance;
use crate::types::ids::{DepositId, TransactionId, VirtualNuban};

#[derive(Error, Debug)]
pub enum Error {
    // Payment Provider Errors
    #[error("Payment provider unavailable for {account}: {reason}")]
    ProviderUnavailable {
        account: VirtualNuban,
        reason: String,
    },

    #[error("Malformed payment provider response for {account}: {reason}")]
    MalformedProviderResponse {
        account: VirtualNuban,
        reason: String,
    },

    // Store Errors
    #[error("Persistence failure during {operation} for {account} (deposit {deposit_id:?}): {reason}")]
    PersistenceFailure {
        account: VirtualNuban,
        deposit_id: Option<DepositId>,
        operation: &'static str,
        reason: String,
    },

    #[error("Account not found: {0}")]
    AccountNotFound(VirtualNuban),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(VirtualNuban),

    #[error("Deposit {deposit_id} already processed for {account}")]
    DepositAlreadyProcessed {
        account: VirtualNuban,
        deposit_id: DepositId,
    },

    #[error("Balance changed concurrently for {account}: expected={expected}, actual={actual}")]
    BalanceConflict {
        account: VirtualNuban,
        expected: Balance,
        actual: Balance,
    },

    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    #[error("Account lock unavailable: {0}")]
    LockUnavailable(VirtualNuban),

    // Balance Errors
    #[error("Insufficient balance: required={required}, available={available}")]
    InsufficientBalance {
        required: Balance,
        available: Balance,
    },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Balance),

    // Audit Errors
    #[error("Reconciliation failed: expected={expected}, actual={actual}")]
    ReconciliationFailed {
        expected: Balance,
        actual: Balance,
    },

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl Error {
    /// True when re-running the same operation later can succeed without
    /// operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnavailable { .. }
                | Error::MalformedProviderResponse { .. }
                | Error::PersistenceFailure { .. }
                | Error::BalanceConflict { .. }
                | Error::LockUnavailable(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
