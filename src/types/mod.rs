pub mod balance;
pub mod ids;
