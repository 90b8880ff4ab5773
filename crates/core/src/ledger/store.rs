//! Storage capabilities the ledger logic runs against.
//!
//! Implemented by the Postgres store in `walletd-db`, by the in-memory ledger
//! behind the `testing` feature, and by mocks in unit tests.

use async_trait::async_trait;
use walletd_shared::WalletId;

use super::entity::{CreditEntry, DebitEntry, WalletBalance};
use super::error::LedgerError;

/// Balance and entry operations of one unit of work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// Loads the balance row, failing with `WalletNotFound` if absent.
    async fn get_balance(&self, wallet_id: WalletId) -> Result<WalletBalance, LedgerError>;

    /// Inserts or overwrites the balance row.
    async fn save_balance(&self, balance: WalletBalance) -> Result<(), LedgerError>;

    /// Appends a debit entry.
    async fn add_debit_entry(&self, entry: DebitEntry) -> Result<(), LedgerError>;

    /// Appends a credit entry.
    async fn add_credit_entry(&self, entry: CreditEntry) -> Result<(), LedgerError>;
}

/// A [`WalletStore`] bound to one serializable transaction.
///
/// Finishing consumes the handle, so a committed or rolled back transaction
/// cannot be reused.
#[async_trait]
pub trait WalletStoreTx: WalletStore {
    /// Commits the unit of work. A serialization failure maps to `TxConflict`.
    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    /// Discards the unit of work.
    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}

/// Opens transactions.
#[async_trait]
pub trait WalletStoreTxFactory: Send + Sync {
    /// Begins a new transaction under serializable isolation.
    async fn new_tx(&self) -> Result<Box<dyn WalletStoreTx>, LedgerError>;
}
