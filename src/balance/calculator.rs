use rust_decimal::Decimal;
use crate::config::fees::FeeConfig;
use crate::error::{Error, Result};
use crate::types::balance::Balance;

/// Intermediate values of a deposit credit, kept for the transaction record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepositBreakdown {
    pub full_amount: Balance,
    pub deduction: Balance,
    pub net_credited: Balance,
    pub new_balance: Balance,
}

/// Fee-adjusted balance deltas for deposits, transfers and payments, plus the
/// affordability checks run before any debit. Pure; callers reject
/// non-positive amounts first.
#[derive(Clone, Debug)]
pub struct BalanceCalculator {
    config: FeeConfig,
}

impl BalanceCalculator {
    pub fn new(config: FeeConfig) -> Result<Self> {
        if config.deposit_unit_divisor.is_zero() || config.deposit_unit_divisor.is_sign_negative() {
            return Err(Error::ConfigError(format!(
                "deposit_unit_divisor must be positive, got {}",
                config.deposit_unit_divisor
            )));
        }
        Ok(BalanceCalculator { config })
    }

    pub fn transfer_fee(&self) -> Balance {
        Balance::from_decimal(self.config.transfer_flat_fee)
    }

    /// Credit for a provider-reported gross deposit.
    ///
    /// The gross amount is first scaled down by the unit divisor, then the
    /// deposit fee rate is taken off the scaled amount.
    pub fn compute_deposit(&self, current: Balance, gross: Decimal) -> DepositBreakdown {
        let full_amount = gross / self.config.deposit_unit_divisor;
        let deduction = self.config.deposit_fee_rate * full_amount;
        let net_credited = Balance::from_decimal(full_amount - deduction);

        DepositBreakdown {
            full_amount: Balance::from_decimal(full_amount),
            deduction: Balance::from_decimal(deduction),
            net_credited,
            new_balance: current + net_credited,
        }
    }

    /// Balance after a transfer, flat fee included.
    pub fn compute_transfer_debit(&self, current: Balance, amount: Balance) -> Balance {
        current - amount - self.transfer_fee()
    }

    /// Balance after a bill/airtime payment. Payments carry no fee.
    pub fn compute_payment_debit(&self, current: Balance, amount: Balance) -> Balance {
        current - amount
    }

    pub fn can_afford_payment(&self, balance: Balance, amount: Balance) -> Result<()> {
        if amount > balance {
            return Err(Error::InsufficientBalance {
                required: amount,
                available: balance,
            });
        }
        Ok(())
    }

    pub fn can_afford_transfer(&self, balance: Balance, amount: Balance) -> Result<()> {
        let required = amount + self.transfer_fee();
        if balance < required {
            return Err(Error::InsufficientBalance {
                required,
                available: balance,
            });
        }
        Ok(())
    }
}
