pub mod reconciler;
pub mod scheduler;

pub use reconciler::{DepositOutcome, DepositReconciler, FailedDeposit, ReconcileReport};
pub use scheduler::ReconciliationScheduler;
