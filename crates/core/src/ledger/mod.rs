//! Wallet ledger: persisted shapes, error taxonomy, storage capabilities and
//! the balance mutation rules.

pub mod entity;
pub mod error;
pub mod store;
pub mod usecase;

#[cfg(test)]
mod usecase_props;

pub use entity::{CreditEntry, DebitEntry, Wallet, WalletBalance};
pub use error::LedgerError;
pub use store::{WalletStore, WalletStoreTx, WalletStoreTxFactory};
pub use usecase::WalletUseCases;
