//! Balance cache capability.
//!
//! The cache is an optimization only. Its errors never reach callers of the
//! wallet service; they are logged and treated as a miss or a skipped write.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use walletd_shared::WalletId;

use crate::ledger::WalletBalance;

/// Prefix shared by every balance key.
pub const BALANCE_KEY_PREFIX: &str = "account";

/// Returns the cache key for a wallet balance, e.g. `account:25:balance`.
///
/// Stable across processes so any cache client can interoperate.
#[must_use]
pub fn balance_key(wallet_id: WalletId) -> String {
    format!("{BALANCE_KEY_PREFIX}:{wallet_id}:balance")
}

/// Errors raised by cache backends.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The backend could not be reached or rejected the command.
    #[error("cache backend error: {0}")]
    Backend(String),

    /// A cached value could not be encoded or decoded.
    #[error("cache codec error: {0}")]
    Codec(String),

    /// The backend did not answer in time.
    #[error("cache operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Best-effort balance cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletCacheStore: Send + Sync {
    /// Looks up a balance. `Ok(None)` is a miss.
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Option<WalletBalance>, CacheError>;

    /// Stores a balance, overwriting any previous value.
    async fn save_balance(&self, balance: WalletBalance) -> Result<(), CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_key_shape() {
        let id = WalletId::new(25).unwrap();
        assert_eq!(balance_key(id), "account:25:balance");
    }
}
