//! `SeaORM` entities for the wallet ledger tables.

pub mod prelude;
pub mod wallet_balance;
pub mod wallet_entry;
