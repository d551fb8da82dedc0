pub mod balance_store;
pub mod transaction_store;

pub use balance_store::{BalanceDebit, BalanceStore, DepositCredit};
pub use transaction_store::TransactionStore;
