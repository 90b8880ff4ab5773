//! In-process balance cache using Moka.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use walletd_core::ledger::WalletBalance;
use walletd_core::{CacheError, WalletCacheStore};
use walletd_shared::config::CacheConfig;
use walletd_shared::{Money, WalletId};

/// Default capacity (number of wallets).
const DEFAULT_CAPACITY: u64 = 1024;

/// Default time-to-live (1 minute).
const DEFAULT_TTL_SECS: u64 = 60;

/// Bounded, TTL-expiring balance cache local to this process.
///
/// Cheap to clone; clones share entries.
#[derive(Clone)]
pub struct LocalBalanceCache {
    cache: Cache<WalletId, Money>,
}

impl LocalBalanceCache {
    /// Creates a cache with default settings: 1024 entries, 1 minute TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DEFAULT_CAPACITY, Duration::from_secs(DEFAULT_TTL_SECS))
    }

    /// Creates a cache with a custom capacity and TTL.
    #[must_use]
    pub fn with_config(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache }
    }

    /// Creates a cache from the `cache` config section.
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_config(
            config.local_capacity,
            Duration::from_secs(config.local_ttl_secs),
        )
    }
}

impl Default for LocalBalanceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletCacheStore for LocalBalanceCache {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Option<WalletBalance>, CacheError> {
        Ok(self
            .cache
            .get(&wallet_id)
            .await
            .map(|amount| WalletBalance::new(wallet_id, amount)))
    }

    async fn save_balance(&self, balance: WalletBalance) -> Result<(), CacheError> {
        self.cache.insert(balance.wallet_id, balance.amount).await;
        Ok(())
    }
}
