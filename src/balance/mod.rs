pub mod calculator;

pub use calculator::{BalanceCalculator, DepositBreakdown};
