use std::collections::HashMap;
use crate::error::{Error, Result};
use crate::settlement::accounts::VirtualAccount;
use crate::types::ids::DepositId;

/// Consistency checks over a single account document.
pub struct Reconciliation;

impl Reconciliation {
    /// The balance must equal the sum of everything the ledger recorded.
    pub fn verify_account_ledger(account: &VirtualAccount) -> Result<()> {
        let expected = account.ledger.net_total();

        if account.balance != expected {
            return Err(Error::ReconciliationFailed {
                expected,
                actual: account.balance,
            });
        }

        Ok(())
    }

    /// Every processed deposit ID has exactly one deposit record, and every
    /// deposit record is in the processed set.
    pub fn verify_deposit_uniqueness(account: &VirtualAccount) -> Result<()> {
        let mut seen: HashMap<&DepositId, usize> = HashMap::new();
        for record in account.ledger.deposits() {
            let Some(deposit_id) = &record.deposit_id else {
                return Err(Error::InvariantViolation(format!(
                    "deposit record {} has no deposit id",
                    record.transaction_id
                )));
            };
            *seen.entry(deposit_id).or_default() += 1;
        }

        if let Some((deposit_id, count)) = seen.iter().find(|(_, count)| **count > 1) {
            return Err(Error::InvariantViolation(format!(
                "deposit {} credited {} times on {}",
                deposit_id, count, account.virtual_nuban
            )));
        }

        if seen.len() != account.processed_deposit_ids.len()
            || !account.processed_deposit_ids.iter().all(|id| seen.contains_key(id))
        {
            return Err(Error::InvariantViolation(format!(
                "processed deposit set of {} does not match its deposit records",
                account.virtual_nuban
            )));
        }

        Ok(())
    }

    pub fn verify_account(account: &VirtualAccount) -> Result<()> {
        Self::verify_account_ledger(account)?;
        Self::verify_deposit_uniqueness(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::settlement::ledger::{TransactionKind, TransactionRecord};
    use crate::types::balance::Balance;
    use crate::types::ids::{OrderId, TransactionId, UserId, VirtualNuban};

    fn account() -> VirtualAccount {
        VirtualAccount::new(VirtualNuban::from("8099999999"), UserId::new())
    }

    fn deposit(account: &VirtualAccount, id: &str, amount: i64) -> TransactionRecord {
        TransactionRecord {
            transaction_id: TransactionId::new(),
            order_id: OrderId::new(),
            session_id: "S".to_string(),
            account: account.virtual_nuban.clone(),
            user_id: account.user_id,
            kind: TransactionKind::Deposit,
            amount: Balance::from_i64(amount),
            fee: Balance::zero(),
            balance_after: account.balance + Balance::from_i64(amount),
            description: String::new(),
            counter_party: None,
            deposit_id: Some(DepositId::from(id)),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_consistent_account_passes() {
        let mut acc = account();
        let record = deposit(&acc, "d1", 40);
        acc.apply(Balance::from_i64(40), record);
        assert!(Reconciliation::verify_account(&acc).is_ok());
    }

    #[test]
    fn test_balance_drift_is_detected() {
        let mut acc = account();
        let record = deposit(&acc, "d1", 40);
        acc.apply(Balance::from_i64(40), record);
        acc.balance = Balance::from_i64(80);

        assert!(matches!(
            Reconciliation::verify_account_ledger(&acc),
            Err(Error::ReconciliationFailed { .. })
        ));
    }

    #[test]
    fn test_double_credit_is_detected() {
        let mut acc = account();
        let first = deposit(&acc, "d1", 40);
        acc.apply(Balance::from_i64(40), first);
        let second = deposit(&acc, "d1", 40);
        acc.apply(Balance::from_i64(80), second);

        assert!(Reconciliation::verify_account_ledger(&acc).is_ok());
        assert!(matches!(
            Reconciliation::verify_deposit_uniqueness(&acc),
            Err(Error::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_marked_but_uncredited_is_detected() {
        let mut acc = account();
        acc.processed_deposit_ids.insert(DepositId::from("lost"));
        assert!(matches!(
            Reconciliation::verify_deposit_uniqueness(&acc),
            Err(Error::InvariantViolation(_))
        ));
    }
}
