//! Core ledger logic for walletd.
//!
//! No web or database dependencies: storage and caching are reached through
//! the capability traits in [`ledger::store`] and [`cache`].
//!
//! # Modules
//!
//! - `ledger` - Entities, errors and the balance mutation rules
//! - `cache` - Balance cache capability and key layout
//! - `service` - Retry coordinator, request coalescing and `WalletService`
//! - `testing` - In-memory store and cache (tests and the `testing` feature)

pub mod cache;
pub mod ledger;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{CacheError, WalletCacheStore, balance_key};
pub use ledger::{
    CreditEntry, DebitEntry, LedgerError, Wallet, WalletBalance, WalletStore, WalletStoreTx,
    WalletStoreTxFactory, WalletUseCases,
};
pub use service::{RetryPolicy, RetryScope, WalletService};
