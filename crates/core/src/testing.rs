//! In-memory store and cache doubles.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream crates that need a working wallet service without Postgres or
//! Redis.
//!
//! [`InMemoryLedger`] runs one transaction at a time: opening a transaction
//! waits for the previous one to finish. Writes are staged per transaction
//! and only become visible on commit, which can be told to fail with
//! `TxConflict` to simulate serialization failures. Entry writes can be told
//! to fail with a storage error.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OwnedMutexGuard;
use walletd_shared::{Money, WalletId};

use crate::cache::{CacheError, WalletCacheStore};
use crate::ledger::{
    CreditEntry, DebitEntry, LedgerError, WalletBalance, WalletStore, WalletStoreTx,
    WalletStoreTxFactory,
};

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default, Clone)]
struct LedgerState {
    balances: HashMap<WalletId, Money>,
    debits: Vec<DebitEntry>,
    credits: Vec<CreditEntry>,
}

#[derive(Debug, Default)]
struct LedgerInner {
    committed: Mutex<LedgerState>,
    serial: Arc<tokio::sync::Mutex<()>>,
    read_delay: Mutex<Duration>,
    failing_commits: AtomicUsize,
    failing_entry_writes: AtomicUsize,
    transactions_opened: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    balance_reads: AtomicUsize,
}

/// Transactional in-memory wallet store.
///
/// Cheap to clone; clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    inner: Arc<LedgerInner>,
}

impl InMemoryLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a wallet balance.
    #[must_use]
    pub fn with_wallet(self, wallet_id: WalletId, amount: Money) -> Self {
        lock(&self.inner.committed).balances.insert(wallet_id, amount);
        self
    }

    /// Committed balance of a wallet, if it exists.
    #[must_use]
    pub fn balance(&self, wallet_id: WalletId) -> Option<Money> {
        lock(&self.inner.committed).balances.get(&wallet_id).copied()
    }

    /// Committed debit entries of a wallet, oldest first.
    #[must_use]
    pub fn debit_entries(&self, wallet_id: WalletId) -> Vec<DebitEntry> {
        lock(&self.inner.committed)
            .debits
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .copied()
            .collect()
    }

    /// Committed credit entries of a wallet, oldest first.
    #[must_use]
    pub fn credit_entries(&self, wallet_id: WalletId) -> Vec<CreditEntry> {
        lock(&self.inner.committed)
            .credits
            .iter()
            .filter(|e| e.wallet_id == wallet_id)
            .copied()
            .collect()
    }

    /// Makes the next `n` commits fail with `TxConflict`.
    pub fn fail_next_commits(&self, n: usize) {
        self.inner.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Makes the next `n` debit or credit entry writes fail with a storage
    /// error.
    pub fn fail_next_entry_writes(&self, n: usize) {
        self.inner.failing_entry_writes.store(n, Ordering::SeqCst);
    }

    /// Delays every balance read by `delay`.
    pub fn set_read_delay(&self, delay: Duration) {
        *lock(&self.inner.read_delay) = delay;
    }

    /// Number of transactions opened so far.
    #[must_use]
    pub fn transactions_opened(&self) -> usize {
        self.inner.transactions_opened.load(Ordering::SeqCst)
    }

    /// Number of successful commits.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.inner.commits.load(Ordering::SeqCst)
    }

    /// Number of rollbacks, including failed commits.
    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.inner.rollbacks.load(Ordering::SeqCst)
    }

    /// Number of balance reads served by transactions.
    #[must_use]
    pub fn balance_reads(&self) -> usize {
        self.inner.balance_reads.load(Ordering::SeqCst)
    }

    fn take_commit_failure(&self) -> bool {
        take_one(&self.inner.failing_commits)
    }

    fn check_entry_write(&self) -> Result<(), LedgerError> {
        if take_one(&self.inner.failing_entry_writes) {
            return Err(LedgerError::Storage("injected entry write failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WalletStoreTxFactory for InMemoryLedger {
    async fn new_tx(&self) -> Result<Box<dyn WalletStoreTx>, LedgerError> {
        let guard = Arc::clone(&self.inner.serial).lock_owned().await;
        self.inner.transactions_opened.fetch_add(1, Ordering::SeqCst);
        let staged = lock(&self.inner.committed).clone();

        Ok(Box::new(InMemoryTx {
            ledger: self.clone(),
            staged: Mutex::new(staged),
            _serial: guard,
        }))
    }
}

/// One open transaction over an [`InMemoryLedger`].
struct InMemoryTx {
    ledger: InMemoryLedger,
    staged: Mutex<LedgerState>,
    _serial: OwnedMutexGuard<()>,
}

#[async_trait]
impl WalletStore for InMemoryTx {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<WalletBalance, LedgerError> {
        self.ledger.inner.balance_reads.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.ledger.inner.read_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        lock(&self.staged)
            .balances
            .get(&wallet_id)
            .map(|amount| WalletBalance::new(wallet_id, *amount))
            .ok_or(LedgerError::WalletNotFound(wallet_id))
    }

    async fn save_balance(&self, balance: WalletBalance) -> Result<(), LedgerError> {
        lock(&self.staged)
            .balances
            .insert(balance.wallet_id, balance.amount);
        Ok(())
    }

    async fn add_debit_entry(&self, entry: DebitEntry) -> Result<(), LedgerError> {
        self.ledger.check_entry_write()?;
        lock(&self.staged).debits.push(entry);
        Ok(())
    }

    async fn add_credit_entry(&self, entry: CreditEntry) -> Result<(), LedgerError> {
        self.ledger.check_entry_write()?;
        lock(&self.staged).credits.push(entry);
        Ok(())
    }
}

#[async_trait]
impl WalletStoreTx for InMemoryTx {
    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let inner = &self.ledger.inner;
        if self.ledger.take_commit_failure() {
            inner.rollbacks.fetch_add(1, Ordering::SeqCst);
            return Err(LedgerError::TxConflict);
        }

        let staged = std::mem::take(&mut *lock(&self.staged));
        *lock(&inner.committed) = staged;
        inner.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.ledger.inner.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory balance cache with failure injection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCache {
    inner: Arc<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: Mutex<HashMap<WalletId, Money>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    stalled: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a cached balance without counting it as a write.
    pub fn prime(&self, balance: WalletBalance) {
        lock(&self.inner.entries).insert(balance.wallet_id, balance.amount);
    }

    /// Cached amount of a wallet.
    #[must_use]
    pub fn cached(&self, wallet_id: WalletId) -> Option<Money> {
        lock(&self.inner.entries).get(&wallet_id).copied()
    }

    /// Makes every read fail with a backend error.
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes every read and write wait forever, like a backend that stopped
    /// answering.
    pub fn stall(&self, stalled: bool) {
        self.inner.stalled.store(stalled, Ordering::SeqCst);
    }

    async fn wait_if_stalled(&self) {
        if self.inner.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    /// Number of reads attempted.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Number of writes attempted.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletCacheStore for InMemoryCache {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Option<WalletBalance>, CacheError> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);
        self.wait_if_stalled().await;
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("injected read failure".to_string()));
        }
        Ok(self
            .cached(wallet_id)
            .map(|amount| WalletBalance::new(wallet_id, amount)))
    }

    async fn save_balance(&self, balance: WalletBalance) -> Result<(), CacheError> {
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        self.wait_if_stalled().await;
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("injected write failure".to_string()));
        }
        self.prime(balance);
        Ok(())
    }
}
