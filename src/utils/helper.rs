use chrono::Utc;
use uuid::Uuid;
use crate::types::ids::{OrderId, TransactionId};

/// Generate a new transaction ID
pub fn generate_transaction_id() -> TransactionId {
    TransactionId(Uuid::new_v4())
}

/// Generate a new order ID
pub fn generate_order_id() -> OrderId {
    OrderId(Uuid::new_v4())
}

/// Session IDs are handed to users as a reference: a UTC timestamp followed
/// by six random digits.
pub fn generate_session_id() -> String {
    let suffix = Uuid::new_v4().as_u128() % 1_000_000;
    format!("{}{:06}", Utc::now().format("%Y%m%d%H%M%S"), suffix)
}

/// Alert operations team (critical)
pub fn alert_operations_team_critical(message: String) {
    tracing::error!(target: "alerts", severity = "critical", "CRITICAL ALERT: {}", message);
}

/// Alert operations team (warning)
pub fn alert_operations_team_warning(message: String) {
    tracing::warn!(target: "alerts", severity = "warning", "WARNING ALERT: {}", message);
}
