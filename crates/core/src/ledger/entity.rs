//! Persisted ledger shapes.

use serde::{Deserialize, Serialize};
use walletd_shared::{Money, WalletId};

/// A wallet. Identity only; balances live in [`WalletBalance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Wallet {
    /// Wallet identifier.
    pub id: WalletId,
}

/// Materialized current balance of a wallet.
///
/// One row per wallet, updated in place. The amount is never negative once
/// committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// Wallet the balance belongs to.
    pub wallet_id: WalletId,
    /// Current amount.
    pub amount: Money,
}

impl WalletBalance {
    /// Creates a balance snapshot.
    #[must_use]
    pub const fn new(wallet_id: WalletId, amount: Money) -> Self {
        Self { wallet_id, amount }
    }
}

/// Append-only record of money added to a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitEntry {
    /// Target wallet.
    pub wallet_id: WalletId,
    /// Amount added; must be strictly positive.
    pub amount: Money,
}

impl DebitEntry {
    /// Creates a debit entry.
    #[must_use]
    pub const fn new(wallet_id: WalletId, amount: Money) -> Self {
        Self { wallet_id, amount }
    }
}

/// Append-only record of money taken from a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditEntry {
    /// Source wallet.
    pub wallet_id: WalletId,
    /// Amount removed; must be strictly positive.
    pub amount: Money,
}

impl CreditEntry {
    /// Creates a credit entry.
    #[must_use]
    pub const fn new(wallet_id: WalletId, amount: Money) -> Self {
        Self { wallet_id, amount }
    }
}
