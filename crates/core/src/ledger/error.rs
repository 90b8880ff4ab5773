//! Ledger error types.
//!
//! Every layer below the HTTP surface speaks this taxonomy. Storage engines
//! translate their own failures into it at the storage boundary, so nothing
//! above the store ever sees an engine-specific error.

use thiserror::Error;
use walletd_shared::WalletId;

/// Errors that can occur during ledger operations.
///
/// `Clone` so that every waiter on a coalesced read receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Amount was zero or negative. Raised before any I/O.
    #[error("invalid amount")]
    InvalidAmount,

    // ========== Balance Errors ==========
    /// No balance row exists for the wallet.
    #[error("wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// The credit would drive the balance below zero.
    #[error("insufficient funds")]
    InsufficientFunds,

    // ========== Concurrency Errors ==========
    /// The storage engine aborted the transaction to keep it serializable.
    #[error("transaction conflict, please retry")]
    TxConflict,

    /// The operation did not finish before its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The operation was cancelled before it produced a result.
    #[error("operation cancelled")]
    Cancelled,

    // ========== Infrastructure Errors ==========
    /// Storage failure that has no more specific kind.
    #[error("storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::InsufficientFunds => "INSUFFICIENT_FUNDS",
            Self::TxConflict => "TX_CONFLICT",
            Self::Timeout => "TIMEOUT",
            Self::Cancelled => "CANCELLED",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns true for serialization conflicts.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::TxConflict)
    }
}
