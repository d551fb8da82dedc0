use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FeeConfig {
    /// Provider amounts are divided by this before any fee applies.
    pub deposit_unit_divisor: Decimal,
    pub deposit_fee_rate: Decimal,
    pub transfer_flat_fee: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        FeeConfig {
            deposit_unit_divisor: Decimal::ONE_HUNDRED,
            deposit_fee_rate: Decimal::new(1, 2),   // 1%
            transfer_flat_fee: Decimal::new(50, 0), // 50.00 per transfer
        }
    }
}
