pub mod http;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::settlement::ledger::CounterParty;
use crate::types::ids::{DepositId, VirtualNuban};

pub use http::HttpPaymentProvider;

/// One incoming payment as reported by the provider. Never mutated locally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub id: DepositId,
    pub account: VirtualNuban,
    /// Gross amount in the provider's units.
    pub amount: Decimal,
    pub currency: Option<String>,
    pub counter_party: CounterParty,
    pub narration: Option<String>,
    pub payment_reference: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// All deposits the provider currently reports for `account`, already
    /// seen or not.
    async fn list_deposits(&self, account: &VirtualNuban) -> Result<Vec<DepositEvent>>;
}
