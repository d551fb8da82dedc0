pub mod balance;
pub mod config;
pub mod deposit;
pub mod error;
pub mod interfaces;
pub mod observability;
pub mod provider;
pub mod settlement;
pub mod types;
pub mod utils;

pub use balance::{BalanceCalculator, DepositBreakdown};
pub use deposit::{DepositReconciler, ReconcileReport, ReconciliationScheduler};
pub use error::{Error, Result};
pub use provider::{DepositEvent, HttpPaymentProvider, PaymentProvider};
pub use settlement::{DebitService, InMemoryStore};
pub use types::balance::Balance;
pub use types::ids::{DepositId, OrderId, TransactionId, UserId, VirtualNuban};
