pub mod account_locks;
pub mod accounts;
pub mod debits;
pub mod ledger;
pub mod memory_store;
pub mod reconciliation;

pub use account_locks::AccountLocks;
pub use accounts::VirtualAccount;
pub use debits::DebitService;
pub use ledger::{CounterParty, Ledger, TransactionKind, TransactionRecord};
pub use memory_store::InMemoryStore;
pub use reconciliation::Reconciliation;
