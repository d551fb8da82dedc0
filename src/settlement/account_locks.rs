use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use crate::error::{Error, Result};
use crate::types::ids::VirtualNuban;

/// Per-account advisory locks. Holding the guard means no other
/// reconciliation of the same account is in progress in this process.
#[derive(Default)]
pub struct AccountLocks {
    locks: DashMap<VirtualNuban, Arc<Mutex<()>>>,
}

/// Released on drop.
pub struct AccountLockGuard {
    account: VirtualNuban,
    _guard: OwnedMutexGuard<()>,
}

impl AccountLockGuard {
    pub fn account(&self) -> &VirtualNuban {
        &self.account
    }
}

impl AccountLocks {
    pub fn new() -> Self {
        AccountLocks {
            locks: DashMap::new(),
        }
    }

    /// Waits up to `timeout` for the account's lock.
    pub async fn acquire(&self, account: &VirtualNuban, timeout: Duration) -> Result<AccountLockGuard> {
        // Clone the Arc out so the map shard is not held while waiting.
        let lock = self.locks.entry(account.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let guard = tokio::time::timeout(timeout, lock.lock_owned())
            .await
            .map_err(|_| Error::LockUnavailable(account.clone()))?;

        Ok(AccountLockGuard {
            account: account.clone(),
            _guard: guard,
        })
    }

    pub fn is_locked(&self, account: &VirtualNuban) -> bool {
        self.locks.get(account)
            .map(|lock| lock.try_lock().is_err())
            .unwrap_or(false)
    }
}
