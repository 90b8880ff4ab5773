//! Orchestration over the ledger logic: transactions, retries, coalesced
//! cached reads.

pub mod coalesce;
pub mod retry;
pub mod wallet;

pub use coalesce::RequestGroup;
pub use retry::{RetryPolicy, RetryScope, TxRunner, TxWork};
pub use wallet::{DEFAULT_LOAD_TIMEOUT, WalletService};
