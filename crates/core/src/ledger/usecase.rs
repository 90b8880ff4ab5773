//! Balance mutation rules.
//!
//! Pure logic over an injected [`WalletStore`]: the same code runs against a
//! live transaction or a test double. Atomicity is the caller's concern; the
//! rules only guarantee ordering (balance row before entry row) and that no
//! write happens for an invalid or uncovered mutation.

use walletd_shared::WalletId;

use super::entity::{CreditEntry, DebitEntry, WalletBalance};
use super::error::LedgerError;
use super::store::WalletStore;

/// Ledger operations bound to one store.
pub struct WalletUseCases<'a, S: WalletStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: WalletStore + ?Sized> WalletUseCases<'a, S> {
    /// Binds the operations to a store.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Returns the current balance of a wallet.
    pub async fn retrieve_balance(&self, wallet_id: WalletId) -> Result<WalletBalance, LedgerError> {
        self.store.get_balance(wallet_id).await
    }

    /// Adds `entry.amount` to the wallet and records a debit entry.
    ///
    /// Returns the new balance.
    pub async fn debit_money(&self, entry: DebitEntry) -> Result<WalletBalance, LedgerError> {
        if !entry.amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut balance = self.store.get_balance(entry.wallet_id).await?;
        balance.amount = balance.amount + entry.amount;

        self.store.save_balance(balance).await?;
        self.store.add_debit_entry(entry).await?;

        Ok(balance)
    }

    /// Removes `entry.amount` from the wallet and records a credit entry.
    ///
    /// Fails with `InsufficientFunds`, writing nothing, if the balance would
    /// become negative. Returns the new balance.
    pub async fn credit_money(&self, entry: CreditEntry) -> Result<WalletBalance, LedgerError> {
        if !entry.amount.is_positive() {
            return Err(LedgerError::InvalidAmount);
        }

        let mut balance = self.store.get_balance(entry.wallet_id).await?;
        let remaining = balance.amount - entry.amount;
        if remaining.is_negative() {
            return Err(LedgerError::InsufficientFunds);
        }

        balance.amount = remaining;
        self.store.save_balance(balance).await?;
        self.store.add_credit_entry(entry).await?;

        Ok(balance)
    }
}
