//! Wallet service: the entry point collaborators call.
//!
//! Reads go cache first, then through a coalesced single-attempt
//! transaction. Mutations run under the retry coordinator and write the new
//! balance through to the cache once committed. Cache failures are logged
//! and never reach the caller. Every cache call is bounded by the cache
//! timeout; an unanswered call counts as a failure.
//!
//! A coalesced load fills the cache with the balance it read. If a mutation
//! commits and writes through while that load is still running, the fill
//! can overwrite the newer value until the next write or until the entry
//! expires.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use walletd_shared::WalletId;

use super::coalesce::RequestGroup;
use super::retry::{RetryPolicy, TxRunner};
use crate::cache::{CacheError, WalletCacheStore};
use crate::ledger::{
    CreditEntry, DebitEntry, LedgerError, WalletBalance, WalletStoreTxFactory, WalletUseCases,
};

/// Default bound on a coalesced balance load.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bound on a single cache call.
pub const DEFAULT_CACHE_TIMEOUT: Duration = Duration::from_millis(250);

/// Transactional wallet operations fronted by a read-through cache.
pub struct WalletService {
    runner: TxRunner,
    cache: Arc<dyn WalletCacheStore>,
    loads: RequestGroup<WalletId, WalletBalance>,
    load_timeout: Duration,
    cache_timeout: Duration,
}

impl WalletService {
    /// Creates a service over a transaction factory and a cache.
    #[must_use]
    pub fn new(
        factory: Arc<dyn WalletStoreTxFactory>,
        cache: Arc<dyn WalletCacheStore>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            runner: TxRunner::new(factory, policy),
            cache,
            loads: RequestGroup::new(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
        }
    }

    /// Sets the bound on a coalesced balance load.
    #[must_use]
    pub const fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    /// Sets the bound on a single cache call.
    #[must_use]
    pub const fn with_cache_timeout(mut self, timeout: Duration) -> Self {
        self.cache_timeout = timeout;
        self
    }

    /// Returns the balance of a wallet.
    ///
    /// On a cache miss, concurrent callers for the same wallet share one
    /// transactional read. The loaded value is written to the cache before
    /// any waiter sees it.
    ///
    /// # Errors
    ///
    /// `WalletNotFound` if the wallet has no balance row, `Timeout` if the
    /// load exceeds the load timeout, or a storage error.
    pub async fn get_balance(&self, wallet_id: WalletId) -> Result<WalletBalance, LedgerError> {
        match cached_balance(self.cache.as_ref(), wallet_id, self.cache_timeout).await {
            Ok(Some(balance)) => {
                debug!(wallet_id = %wallet_id, "balance cache hit");
                return Ok(balance);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(wallet_id = %wallet_id, error = %err, "balance cache read failed");
            }
        }

        let runner = self.runner.clone();
        let cache = Arc::clone(&self.cache);
        let cache_timeout = self.cache_timeout;
        self.loads
            .call(wallet_id, self.load_timeout, move || async move {
                let balance = runner
                    .run_once(move |tx| {
                        Box::pin(async move { WalletUseCases::new(tx).retrieve_balance(wallet_id).await })
                    })
                    .await?;
                write_through(cache.as_ref(), balance, cache_timeout).await;
                Ok(balance)
            })
            .await
    }

    /// Adds money to a wallet and records a debit entry.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive amount, without touching storage.
    /// Otherwise the last error of the retry coordinator.
    pub async fn debit_money(&self, entry: DebitEntry) -> Result<WalletBalance, LedgerError> {
        if !entry.amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }

        let balance = self
            .runner
            .run_or_repeat(move |tx| {
                Box::pin(async move { WalletUseCases::new(tx).debit_money(entry).await })
            })
            .await?;

        debug!(wallet_id = %entry.wallet_id, amount = %entry.amount, "debit committed");
        write_through(self.cache.as_ref(), balance, self.cache_timeout).await;
        Ok(balance)
    }

    /// Removes money from a wallet and records a credit entry.
    ///
    /// # Errors
    ///
    /// `InvalidAmount` for a non-positive amount, without touching storage.
    /// `InsufficientFunds` if the balance would go negative. Otherwise the
    /// last error of the retry coordinator.
    pub async fn credit_money(&self, entry: CreditEntry) -> Result<WalletBalance, LedgerError> {
        if !entry.amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }

        let balance = self
            .runner
            .run_or_repeat(move |tx| {
                Box::pin(async move { WalletUseCases::new(tx).credit_money(entry).await })
            })
            .await?;

        debug!(wallet_id = %entry.wallet_id, amount = %entry.amount, "credit committed");
        write_through(self.cache.as_ref(), balance, self.cache_timeout).await;
        Ok(balance)
    }
}

async fn cached_balance(
    cache: &dyn WalletCacheStore,
    wallet_id: WalletId,
    timeout: Duration,
) -> Result<Option<WalletBalance>, CacheError> {
    tokio::time::timeout(timeout, cache.get_balance(wallet_id))
        .await
        .map_err(|_| CacheError::Timeout(timeout))?
}

async fn write_through(cache: &dyn WalletCacheStore, balance: WalletBalance, timeout: Duration) {
    let result = tokio::time::timeout(timeout, cache.save_balance(balance))
        .await
        .map_err(|_| CacheError::Timeout(timeout))
        .and_then(|saved| saved);
    if let Err(err) = result {
        warn!(wallet_id = %balance.wallet_id, error = %err, "balance cache write failed");
    }
}
