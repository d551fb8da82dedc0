use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Neg, Sub};

/// Currency amount in major units (naira, not kobo).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    pub const fn from_decimal(value: Decimal) -> Self {
        Balance(value)
    }

    pub fn from_i64(value: i64) -> Self {
        Balance(Decimal::from(value))
    }

    pub fn zero() -> Self {
        Balance(Decimal::ZERO)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl From<Decimal> for Balance {
    fn from(value: Decimal) -> Self {
        Balance(value)
    }
}

impl Add for Balance {
    type Output = Balance;
    fn add(self, other: Balance) -> Balance {
        Balance(self.0 + other.0)
    }
}

impl Sub for Balance {
    type Output = Balance;
    fn sub(self, other: Balance) -> Balance {
        Balance(self.0 - other.0)
    }
}

impl Neg for Balance {
    type Output = Balance;
    fn neg(self) -> Balance {
        Balance(-self.0)
    }
}

impl Sum for Balance {
    fn sum<I: Iterator<Item = Balance>>(iter: I) -> Balance {
        iter.fold(Balance::zero(), |acc, b| acc + b)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
