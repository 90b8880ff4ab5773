//! Balance cache stores.
//!
//! - `local` - in-process moka cache, absorbs hot-key reads
//! - `redis_cache` - shared Redis cache, survives process restarts
//! - `layered` - local in front of shared
//!
//! Values are stored as JSON `{"wallet_id": .., "amount": ..}` with the
//! amount in minor units, under the key from [`walletd_core::balance_key`].

mod layered;
mod local;
mod redis_cache;

pub use layered::LayeredBalanceCache;
pub use local::LocalBalanceCache;
pub use redis_cache::RedisBalanceCache;

use walletd_core::CacheError;
use walletd_core::ledger::WalletBalance;

fn encode(balance: &WalletBalance) -> Result<String, CacheError> {
    serde_json::to_string(balance).map_err(|e| CacheError::Codec(e.to_string()))
}

fn decode(json: &str) -> Result<WalletBalance, CacheError> {
    serde_json::from_str(json).map_err(|e| CacheError::Codec(e.to_string()))
}
