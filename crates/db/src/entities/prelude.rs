//! Entity re-exports.

pub use super::wallet_balance::Entity as WalletBalance;
pub use super::wallet_entry::Entity as WalletEntry;
