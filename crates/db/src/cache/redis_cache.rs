//! Shared balance cache on Redis.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::debug;
use walletd_core::ledger::WalletBalance;
use walletd_core::{CacheError, WalletCacheStore, balance_key};
use walletd_shared::WalletId;

use super::{decode, encode};

/// Balance cache shared by every process pointing at the same Redis.
#[derive(Clone)]
pub struct RedisBalanceCache {
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl RedisBalanceCache {
    /// Wraps a connection manager.
    #[must_use]
    pub const fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    /// Opens a connection manager for `url`.
    pub async fn connect(url: &str, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(backend)?;
        let redis = ConnectionManager::new(client).await.map_err(backend)?;
        Ok(Self::new(redis, ttl_secs))
    }
}

#[async_trait]
impl WalletCacheStore for RedisBalanceCache {
    async fn get_balance(&self, wallet_id: WalletId) -> Result<Option<WalletBalance>, CacheError> {
        let key = balance_key(wallet_id);
        let json: Option<String> = self.redis.clone().get(&key).await.map_err(backend)?;

        match json {
            Some(json) => decode(&json).map(Some),
            None => {
                debug!(key = %key, "shared cache miss");
                Ok(None)
            }
        }
    }

    async fn save_balance(&self, balance: WalletBalance) -> Result<(), CacheError> {
        let key = balance_key(balance.wallet_id);
        let json = encode(&balance)?;
        let _: () = self
            .redis
            .clone()
            .set_ex(&key, json, self.ttl_secs)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

#[allow(clippy::needless_pass_by_value)]
fn backend(err: redis::RedisError) -> CacheError {
    CacheError::Backend(err.to_string())
}
