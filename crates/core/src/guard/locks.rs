//! Per-account exclusive locks.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use pocketbank_shared::types::AccountId;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::ledger::{LedgerError, LedgerResult};

type LockMap = DashMap<AccountId, Arc<Mutex<()>>>;

/// Registry of per-account mutexes.
///
/// Entries live only while some operation holds or waits for them.
#[derive(Debug)]
pub struct AccountLocks {
    locks: Arc<LockMap>,
    timeout: Duration,
}

/// Holds one or more account locks until dropped.
#[derive(Debug)]
pub struct AccountLockGuard {
    accounts: Vec<AccountId>,
    guards: Vec<OwnedMutexGuard<()>>,
    registry: Arc<LockMap>,
}

impl AccountLockGuard {
    /// Accounts held, in acquisition order.
    #[must_use]
    pub fn accounts(&self) -> &[AccountId] {
        &self.accounts
    }
}

impl Drop for AccountLockGuard {
    fn drop(&mut self) {
        self.guards.clear();
        evict_idle(&self.registry, &self.accounts);
    }
}

/// Drops registry entries nobody else holds or waits on.
fn evict_idle(registry: &LockMap, accounts: &[AccountId]) {
    for id in accounts {
        registry.remove_if(id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl AccountLocks {
    /// Creates a registry whose acquisitions give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            timeout,
        }
    }

    /// Locks every account in `accounts`.
    ///
    /// Ids are deduplicated and locked in ascending order, so two operations
    /// over the same pair can never deadlock. The whole acquisition is
    /// bounded by the configured timeout.
    pub async fn acquire(&self, accounts: &[AccountId]) -> LedgerResult<AccountLockGuard> {
        let mut ids = accounts.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let handles: Vec<Arc<Mutex<()>>> = ids
            .iter()
            .map(|id| Arc::clone(self.locks.entry(*id).or_default().value()))
            .collect();

        let acquire_all = async move {
            let mut guards = Vec::with_capacity(handles.len());
            for handle in handles {
                guards.push(handle.lock_owned().await);
            }
            guards
        };

        match tokio::time::timeout(self.timeout, acquire_all).await {
            Ok(guards) => Ok(AccountLockGuard {
                accounts: ids,
                guards,
                registry: Arc::clone(&self.locks),
            }),
            Err(_) => {
                evict_idle(&self.locks, &ids);
                warn!(accounts = ?ids, timeout_ms = self.timeout.as_millis(), "account lock timed out");
                Err(LedgerError::Busy)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_duplicate_ids_do_not_self_deadlock() {
        let locks = AccountLocks::new(Duration::from_millis(100));
        let a = AccountId::new();

        let guard = locks.acquire(&[a, a]).await.unwrap();
        assert_eq!(guard.accounts(), &[a]);
    }

    #[tokio::test]
    async fn test_ids_are_sorted() {
        let locks = AccountLocks::new(Duration::from_millis(100));
        let a = AccountId::new();
        let b = AccountId::new();

        let guard = locks.acquire(&[b, a]).await.unwrap();
        assert_eq!(guard.accounts(), &[a, b]);
    }

    #[tokio::test]
    async fn test_held_lock_times_out_with_busy() {
        let locks = AccountLocks::new(Duration::from_millis(50));
        let a = AccountId::new();
        let b = AccountId::new();

        let _held = locks.acquire(&[a]).await.unwrap();
        let result = locks.acquire(&[b, a]).await;
        assert!(matches!(result, Err(LedgerError::Busy)));

        // The partially acquired lock on `b` was released with the timeout.
        assert!(locks.acquire(&[b]).await.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_leave_the_registry() {
        let locks = AccountLocks::new(Duration::from_millis(100));
        let a = AccountId::new();
        let b = AccountId::new();

        let held = locks.acquire(&[a, b]).await.unwrap();
        assert_eq!(locks.locks.len(), 2);
        drop(held);
        assert!(locks.locks.is_empty());

        let _held = locks.acquire(&[a]).await.unwrap();
        assert!(matches!(locks.acquire(&[a]).await, Err(LedgerError::Busy)));
        assert_eq!(locks.locks.len(), 1);
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = Arc::new(AccountLocks::new(Duration::from_secs(5)));
        let a = AccountId::new();

        let held = locks.acquire(&[a]).await.unwrap();
        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move { locks.acquire(&[a]).await.map(|_| ()) })
        };
        while locks.locks.get(&a).is_some_and(|l| Arc::strong_count(l.value()) < 3) {
            tokio::task::yield_now().await;
        }
        drop(held);

        waiter.await.unwrap().unwrap();
        assert!(locks.locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_opposite_order_pairs_never_deadlock() {
        let locks = Arc::new(AccountLocks::new(Duration::from_secs(5)));
        let a = AccountId::new();
        let b = AccountId::new();
        let done = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..50 {
            let locks = Arc::clone(&locks);
            let done = Arc::clone(&done);
            let pair = if i % 2 == 0 { [a, b] } else { [b, a] };
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&pair).await.unwrap();
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(done.load(Ordering::SeqCst), 50);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_lock_is_exclusive() {
        let locks = Arc::new(AccountLocks::new(Duration::from_secs(5)));
        let a = AccountId::new();
        let inside = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..20 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire(&[a]).await.unwrap();
                assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                tokio::task::yield_now().await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
    }
}
