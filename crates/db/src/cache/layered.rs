//! Local cache in front of the shared cache.

use std::sync::Arc;

use async_trait::async_trait;
use walletd_core::ledger::WalletBalance;
use walletd_core::{CacheError, WalletCacheStore};
use walletd_shared::WalletId;

/// Two cache layers read nearest first.
///
/// A hit in the shared layer back-fills the local layer. Writes go to both
/// layers; the first failing layer's error is returned after both were
/// attempted.
pub struct LayeredBalanceCache {
    local: Arc<dyn WalletCacheStore>,
    shared: Arc<dyn WalletCacheStore>,
}

impl LayeredBalanceCache {
    /// Stacks `local` in front of `shared`.
    #[must_use]
    pub fn new(local: Arc<dyn WalletCacheStore>, shared: Arc<dyn WalletCacheStore>) -> Self {
        Self { local, shared }
    }
}

#[async_trait]
impl WalletCacheStore for LayeredBalanceCache {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Option<WalletBalance>, CacheError> {
        if let Some(balance) = self.local.get_balance(wallet_id).await? {
            return Ok(Some(balance));
        }

        let shared = self.shared.get_balance(wallet_id).await?;
        if let Some(balance) = shared {
            self.local.save_balance(balance).await?;
        }
        Ok(shared)
    }

    async fn save_balance(&self, balance: WalletBalance) -> Result<(), CacheError> {
        let local = self.local.save_balance(balance).await;
        let shared = self.shared.save_balance(balance).await;
        local.and(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::LocalBalanceCache;
    use walletd_core::testing::InMemoryCache;
    use walletd_shared::Money;

    fn wallet(id: i64) -> WalletId {
        WalletId::new(id).unwrap()
    }

    fn balance(id: i64, minor: i64) -> WalletBalance {
        WalletBalance::new(wallet(id), Money::from_minor_units(minor))
    }

    #[tokio::test]
    async fn test_shared_hit_backfills_local() {
        let local = LocalBalanceCache::new();
        let shared = InMemoryCache::new();
        shared.prime(balance(1, 500));
        let cache = LayeredBalanceCache::new(Arc::new(local.clone()), Arc::new(shared.clone()));

        assert_eq!(cache.get_balance(wallet(1)).await.unwrap(), Some(balance(1, 500)));
        assert_eq!(local.get_balance(wallet(1)).await.unwrap(), Some(balance(1, 500)));

        cache.get_balance(wallet(1)).await.unwrap();
        assert_eq!(shared.reads(), 1);
    }

    #[tokio::test]
    async fn test_write_reaches_both_layers() {
        let local = LocalBalanceCache::new();
        let shared = InMemoryCache::new();
        let cache = LayeredBalanceCache::new(Arc::new(local.clone()), Arc::new(shared.clone()));

        cache.save_balance(balance(2, 70)).await.unwrap();

        assert_eq!(local.get_balance(wallet(2)).await.unwrap(), Some(balance(2, 70)));
        assert_eq!(shared.cached(wallet(2)), Some(Money::from_minor_units(70)));
    }

    #[tokio::test]
    async fn test_shared_failure_still_writes_local() {
        let local = LocalBalanceCache::new();
        let shared = InMemoryCache::new();
        shared.fail_writes(true);
        let cache = LayeredBalanceCache::new(Arc::new(local.clone()), Arc::new(shared.clone()));

        assert!(cache.save_balance(balance(3, 9)).await.is_err());
        assert_eq!(local.get_balance(wallet(3)).await.unwrap(), Some(balance(3, 9)));
    }

    #[tokio::test]
    async fn test_shared_read_failure_is_reported() {
        let shared = InMemoryCache::new();
        shared.fail_reads(true);
        let cache = LayeredBalanceCache::new(
            Arc::new(LocalBalanceCache::new()),
            Arc::new(shared),
        );

        assert!(matches!(
            cache.get_balance(wallet(4)).await,
            Err(CacheError::Backend(_))
        ));
    }
}
