//! Transaction runner with exponential-backoff retry.
//!
//! `run_once` wraps one unit of work in a fresh transaction: commit on
//! success, best-effort rollback on failure. `run_or_repeat` re-runs the whole
//! unit of work, never a single statement, each time in a new transaction.
//!
//! By default every failure is retried, not only `TxConflict`. Business
//! failures such as `InsufficientFunds` therefore spend the whole retry budget
//! before surfacing. `RetryScope::ConflictOnly` narrows retries to conflicts.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backoff::ExponentialBackoff;
use futures::future::BoxFuture;
use tracing::{debug, warn};
use walletd_shared::config::RetryConfig;

pub use walletd_shared::config::RetryScope;

use crate::ledger::{LedgerError, WalletStoreTx, WalletStoreTxFactory};

/// Future returned by a unit of work borrowing its transaction.
pub type TxWork<'t, T> = BoxFuture<'t, Result<T, LedgerError>>;

/// Backoff schedule for [`TxRunner::run_or_repeat`].
///
/// A plain value: every call builds its own backoff state from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first backoff retry.
    pub initial_interval: Duration,
    /// Upper bound for a single delay.
    pub max_interval: Duration,
    /// Total time budget after which the last error is returned.
    pub max_elapsed_time: Duration,
    /// Which failures are retried.
    pub scope: RetryScope,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(1),
            max_elapsed_time: Duration::from_secs(5),
            scope: RetryScope::AnyError,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            initial_interval: Duration::from_millis(config.initial_interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            max_elapsed_time: Duration::from_millis(config.max_elapsed_ms),
            scope: config.scope,
        }
    }
}

impl RetryPolicy {
    /// Returns true if `err` should trigger another attempt.
    #[must_use]
    pub const fn should_retry(&self, err: &LedgerError) -> bool {
        match self.scope {
            RetryScope::AnyError => true,
            RetryScope::ConflictOnly => err.is_conflict(),
        }
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_interval,
            initial_interval: self.initial_interval,
            max_interval: self.max_interval,
            max_elapsed_time: Some(self.max_elapsed_time),
            ..ExponentialBackoff::default()
        }
    }
}

/// Runs units of work inside transactions.
#[derive(Clone)]
pub struct TxRunner {
    factory: Arc<dyn WalletStoreTxFactory>,
    policy: RetryPolicy,
}

impl TxRunner {
    /// Creates a runner over a transaction factory.
    #[must_use]
    pub fn new(factory: Arc<dyn WalletStoreTxFactory>, policy: RetryPolicy) -> Self {
        Self { factory, policy }
    }

    /// Runs `work` once in a new transaction.
    ///
    /// Commits on success. On failure rolls back and returns the work's
    /// error; a rollback failure is logged and never replaces it.
    pub async fn run_once<T, F>(&self, work: F) -> Result<T, LedgerError>
    where
        F: for<'t> Fn(&'t dyn WalletStoreTx) -> TxWork<'t, T> + Send + Sync,
        T: Send,
    {
        let tx = self.factory.new_tx().await?;

        match work(tx.as_ref()).await {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "could not rollback tx");
                }
                Err(err)
            }
        }
    }

    /// Runs `work`, repeating the whole unit of work under exponential
    /// backoff while it fails and the budget lasts.
    ///
    /// When the budget is exhausted the last error is returned unchanged.
    pub async fn run_or_repeat<T, F>(&self, work: F) -> Result<T, LedgerError>
    where
        F: for<'t> Fn(&'t dyn WalletStoreTx) -> TxWork<'t, T> + Send + Sync,
        T: Send,
    {
        let err = match self.run_once(&work).await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !self.policy.should_retry(&err) {
            return Err(err);
        }
        debug!(error = %err, "transaction failed, retrying with backoff");

        let runner = self;
        let work = &work;
        let attempts = AtomicU32::new(1);
        let attempts = &attempts;

        backoff::future::retry_notify(
            self.policy.backoff(),
            move || async move {
                attempts.fetch_add(1, Ordering::Relaxed);
                runner.run_once(work).await.map_err(|err| {
                    if runner.policy.should_retry(&err) {
                        backoff::Error::transient(err)
                    } else {
                        backoff::Error::permanent(err)
                    }
                })
            },
            move |err: LedgerError, delay: Duration| {
                warn!(
                    attempt = attempts.load(Ordering::Relaxed),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transaction attempt failed"
                );
            },
        )
        .await
    }
}
