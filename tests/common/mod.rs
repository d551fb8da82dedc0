#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Barrier;

use wallet_infra::config::{FeeConfig, ReconcilerConfig};
use wallet_infra::interfaces::{BalanceDebit, BalanceStore, DepositCredit};
use wallet_infra::settlement::{CounterParty, VirtualAccount};
use wallet_infra::{
    Balance, BalanceCalculator, DepositEvent, DepositId, DepositReconciler, Error, InMemoryStore,
    PaymentProvider, Result, UserId, VirtualNuban,
};

pub const ACCOUNT: &str = "8055555555";

pub fn nuban() -> VirtualNuban {
    VirtualNuban::from(ACCOUNT)
}

pub fn calculator() -> BalanceCalculator {
    BalanceCalculator::new(FeeConfig::default()).unwrap()
}

pub fn deposit(account: &VirtualNuban, id: &str, gross: i64) -> DepositEvent {
    DepositEvent {
        id: DepositId::from(id),
        account: account.clone(),
        amount: Decimal::from(gross),
        currency: Some("NGN".to_string()),
        counter_party: CounterParty {
            bank_name: Some("Access Bank".to_string()),
            account_name: Some("BISI ADEYEMI".to_string()),
            account_number: Some("0987654321".to_string()),
        },
        narration: Some("wallet funding".to_string()),
        payment_reference: None,
        created_at: None,
    }
}

/// Net credit for a gross amount under the default fee schedule.
pub fn net_of(gross: i64) -> Balance {
    calculator().compute_deposit(Balance::zero(), Decimal::from(gross)).net_credited
}

pub async fn store_with_account(account: &VirtualNuban) -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.create_account(account.clone(), UserId::new()).await.unwrap();
    store
}

pub fn reconciler(
    provider: Arc<dyn PaymentProvider>,
    store: Arc<dyn BalanceStore>,
    config: ReconcilerConfig,
) -> DepositReconciler {
    DepositReconciler::new(provider, store, calculator(), config)
}

/// Plays back one response per call; the last one repeats forever.
pub struct ScriptedProvider {
    responses: Vec<Vec<DepositEvent>>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Vec<DepositEvent>>) -> Self {
        ScriptedProvider {
            responses,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn repeating(events: Vec<DepositEvent>) -> Self {
        Self::new(vec![events])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for ScriptedProvider {
    async fn list_deposits(&self, account: &VirtualNuban) -> Result<Vec<DepositEvent>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = call.min(self.responses.len().saturating_sub(1));
        Ok(self.responses
            .get(index)
            .map(|events| events.iter().filter(|e| &e.account == account).cloned().collect())
            .unwrap_or_default())
    }
}

/// Sleeps before answering.
pub struct SlowProvider {
    pub delay: Duration,
    pub events: Vec<DepositEvent>,
}

#[async_trait]
impl PaymentProvider for SlowProvider {
    async fn list_deposits(&self, _account: &VirtualNuban) -> Result<Vec<DepositEvent>> {
        tokio::time::sleep(self.delay).await;
        Ok(self.events.clone())
    }
}

/// Wraps the in-memory store with failure injection and interleaving hooks.
pub struct TestStore {
    pub inner: Arc<InMemoryStore>,
    /// Deposit IDs whose credit fails once per entry (entries are consumed).
    failing_credits: Mutex<Vec<DepositId>>,
    lookup_delay: Option<Duration>,
    read_delay: Option<Duration>,
    /// When set, the first `parties` calls to `get_account` wait for each other.
    read_barrier: Option<(Arc<Barrier>, usize)>,
    reads: AtomicUsize,
    pub credit_attempts: AtomicUsize,
}

impl TestStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        TestStore {
            inner,
            failing_credits: Mutex::new(Vec::new()),
            lookup_delay: None,
            read_delay: None,
            read_barrier: None,
            reads: AtomicUsize::new(0),
            credit_attempts: AtomicUsize::new(0),
        }
    }

    pub fn fail_credit_once(self, deposit_id: &str) -> Self {
        self.failing_credits.lock().unwrap().push(DepositId::from(deposit_id));
        self
    }

    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = Some(delay);
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn with_read_barrier(mut self, parties: usize) -> Self {
        self.read_barrier = Some((Arc::new(Barrier::new(parties)), parties));
        self
    }
}

#[async_trait]
impl BalanceStore for TestStore {
    async fn create_account(&self, account: VirtualNuban, user_id: UserId) -> Result<VirtualAccount> {
        self.inner.create_account(account, user_id).await
    }

    async fn get_account(&self, account: &VirtualNuban) -> Result<VirtualAccount> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some((barrier, parties)) = &self.read_barrier {
            if self.reads.fetch_add(1, Ordering::SeqCst) < *parties {
                barrier.wait().await;
            }
        }
        self.inner.get_account(account).await
    }

    async fn get_balance(&self, account: &VirtualNuban) -> Result<Balance> {
        self.inner.get_balance(account).await
    }

    async fn set_balance(&self, account: &VirtualNuban, amount: Balance) -> Result<()> {
        self.inner.set_balance(account, amount).await
    }

    async fn has_processed_deposit(&self, account: &VirtualNuban, deposit_id: &DepositId) -> Result<bool> {
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.has_processed_deposit(account, deposit_id).await
    }

    async fn mark_processed_and_credit(&self, credit: DepositCredit) -> Result<()> {
        self.credit_attempts.fetch_add(1, Ordering::SeqCst);
        let should_fail = {
            let mut failing = self.failing_credits.lock().unwrap();
            match failing.iter().position(|id| id == &credit.deposit_id) {
                Some(index) => {
                    failing.remove(index);
                    true
                }
                None => false,
            }
        };
        if should_fail {
            return Err(Error::PersistenceFailure {
                account: credit.account,
                deposit_id: Some(credit.deposit_id),
                operation: "mark_processed_and_credit",
                reason: "write concern not satisfied".to_string(),
            });
        }
        self.inner.mark_processed_and_credit(credit).await
    }

    async fn apply_debit(&self, debit: BalanceDebit) -> Result<()> {
        self.inner.apply_debit(debit).await
    }
}
