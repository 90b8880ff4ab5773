//! Per-key request coalescing.
//!
//! Concurrent callers asking for the same key share one in-flight load. The
//! first caller spawns the load and records a shared future in the map;
//! later callers clone that future. The load removes its own entry when it
//! finishes, so the next caller after completion starts a fresh load.
//!
//! The load runs on its own task: a waiter that goes away (dropped future,
//! caller deadline) never cancels it for the others. The load itself is
//! bounded by a timeout. A timed out load resolves every waiter with
//! `Timeout`; an aborted or panicked one with `Cancelled`.
//!
//! Coalescing is per process. Two processes may still load the same key at
//! the same time.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{error, trace};

use crate::ledger::LedgerError;

type SharedLoad<V> = Shared<BoxFuture<'static, Result<V, LedgerError>>>;

/// Deduplicates concurrent loads by key.
pub struct RequestGroup<K, V> {
    calls: Arc<DashMap<K, SharedLoad<V>>>,
}

impl<K, V> RequestGroup<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Arc::new(DashMap::new()),
        }
    }

    /// Returns the result of the in-flight load for `key`, starting one with
    /// `load` if none is running.
    ///
    /// `load` is only invoked by the caller that starts the load.
    pub async fn call<F, Fut>(&self, key: K, timeout: Duration, load: F) -> Result<V, LedgerError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, LedgerError>> + Send + 'static,
    {
        let shared = match self.calls.entry(key.clone()) {
            Entry::Occupied(entry) => {
                trace!(key = ?key, "joining in-flight load");
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let shared = self.spawn_load(key, timeout, load());
                entry.insert(shared.clone());
                shared
            }
        };

        shared.await
    }

    /// Number of loads currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.calls.len()
    }

    fn spawn_load<Fut>(&self, key: K, timeout: Duration, load: Fut) -> SharedLoad<V>
    where
        Fut: Future<Output = Result<V, LedgerError>> + Send + 'static,
    {
        let guard = RemoveOnDrop {
            calls: Arc::clone(&self.calls),
            key,
        };

        let handle = tokio::spawn(async move {
            // Removes the entry on completion, abort and panic alike.
            let _guard = guard;
            match tokio::time::timeout(timeout, load).await {
                Ok(result) => result,
                Err(_) => Err(LedgerError::Timeout),
            }
        });

        async move {
            match handle.await {
                Ok(result) => result,
                Err(join_err) => {
                    if join_err.is_panic() {
                        error!(error = %join_err, "coalesced load panicked");
                    }
                    Err(LedgerError::Cancelled)
                }
            }
        }
        .boxed()
        .shared()
    }
}

impl<K, V> Default for RequestGroup<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

struct RemoveOnDrop<K: Eq + Hash, V> {
    calls: Arc<DashMap<K, SharedLoad<V>>>,
    key: K,
}

impl<K: Eq + Hash, V> Drop for RemoveOnDrop<K, V> {
    fn drop(&mut self) {
        self.calls.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const LONG: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_concurrent_calls_share_one_load() {
        let group: RequestGroup<u32, u64> = RequestGroup::new();
        let loads = Arc::new(AtomicUsize::new(0));

        let calls = (0..10).map(|_| {
            let loads = Arc::clone(&loads);
            group.call(7, LONG, move || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(42)
            })
        });
        let results = join_all(calls).await;

        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|r| *r == Ok(42)));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_waiters_share_the_error() {
        let group: RequestGroup<u32, u64> = RequestGroup::new();

        let calls = (0..3).map(|_| {
            group.call(1, LONG, || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(LedgerError::TxConflict)
            })
        });
        let results = join_all(calls).await;

        assert!(results.iter().all(|r| *r == Err(LedgerError::TxConflict)));
    }

    #[tokio::test]
    async fn test_distinct_keys_load_independently() {
        let group: RequestGroup<u32, u32> = RequestGroup::new();
        let loads = Arc::new(AtomicUsize::new(0));

        let calls = (0..4).map(|key| {
            let loads = Arc::clone(&loads);
            group.call(key, LONG, move || async move {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok(key * 10)
            })
        });
        let results = join_all(calls).await;

        assert_eq!(loads.load(Ordering::SeqCst), 4);
        assert_eq!(results, vec![Ok(0), Ok(10), Ok(20), Ok(30)]);
    }

    #[tokio::test]
    async fn test_sequential_calls_reload() {
        let group: RequestGroup<u32, usize> = RequestGroup::new();
        let loads = Arc::new(AtomicUsize::new(0));

        for expected in 1..=2 {
            let loads = Arc::clone(&loads);
            let value = group
                .call(1, LONG, move || async move {
                    Ok(loads.fetch_add(1, Ordering::SeqCst) + 1)
                })
                .await;
            assert_eq!(value, Ok(expected));
        }
    }

    #[tokio::test]
    async fn test_timeout_reaches_every_waiter() {
        let group: RequestGroup<u32, u64> = RequestGroup::new();

        let calls = (0..3).map(|_| {
            group.call(1, Duration::from_millis(20), || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(1)
            })
        });
        let results = join_all(calls).await;

        assert!(results.iter().all(|r| *r == Err(LedgerError::Timeout)));
        assert_eq!(group.in_flight(), 0);
    }

    async fn panicking_load() -> Result<u64, LedgerError> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        panic!("load blew up");
    }

    #[tokio::test]
    async fn test_panicked_load_cancels_every_waiter() {
        let group: RequestGroup<u32, u64> = RequestGroup::new();

        let calls = (0..3).map(|_| group.call(1, LONG, panicking_load));
        let results = join_all(calls).await;

        assert!(results.iter().all(|r| *r == Err(LedgerError::Cancelled)));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_dropped_waiter_does_not_cancel_others() {
        let group: Arc<RequestGroup<u32, u64>> = Arc::new(RequestGroup::new());

        let first = {
            let group = Arc::clone(&group);
            tokio::spawn(async move {
                group
                    .call(1, LONG, || async {
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(9)
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = {
            let group = Arc::clone(&group);
            tokio::spawn(async move {
                group
                    .call(1, LONG, || async { Ok(0) })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        first.abort();
        assert_eq!(second.await.unwrap(), Ok(9));
    }
}
