//! Request deduplication keyed by a caller-supplied `Idempotency-Key`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use moka::future::Cache;
use pocketbank_shared::types::AccountId;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::ledger::validation::validate_idempotency_key;
use crate::ledger::{LedgerError, LedgerResult};
use crate::ports::Repositories;

/// Maximum number of replayable results kept in memory.
const CACHE_CAPACITY: u64 = 100_000;

/// A persisted successful result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdempotencyRecord {
    /// `{account}:{operation}`.
    pub scope: String,
    /// Caller-supplied key.
    pub key: String,
    /// Serialized result.
    pub response: serde_json::Value,
    /// First execution time.
    pub created_at: DateTime<Utc>,
    /// End of the retention window.
    pub expires_at: DateTime<Utc>,
}

/// A result and whether it came from a previous execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdempotentResult<T> {
    /// The operation result.
    pub value: T,
    /// True if this is a replay.
    pub replayed: bool,
}

impl<T> IdempotentResult<T> {
    /// A result produced by executing now.
    pub const fn fresh(value: T) -> Self {
        Self {
            value,
            replayed: false,
        }
    }
}

/// Executes each (account, operation, key) at most once per retention window.
///
/// Only successes are remembered: a request that failed (including with
/// `Busy`) runs again when retried with the same key.
pub struct IdempotencyGuard {
    repos: Arc<dyn Repositories>,
    clock: Arc<dyn Clock>,
    cache: Cache<String, IdempotencyRecord>,
    in_flight: DashMap<String, Arc<Mutex<()>>>,
    retention: Duration,
    wait_timeout: Duration,
}

impl std::fmt::Debug for IdempotencyGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdempotencyGuard")
            .field("retention", &self.retention)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl IdempotencyGuard {
    /// Creates a guard.
    ///
    /// `wait_timeout` bounds how long a duplicate waits for the in-flight
    /// original before failing with `Busy`.
    #[must_use]
    pub fn new(
        repos: Arc<dyn Repositories>,
        clock: Arc<dyn Clock>,
        retention: Duration,
        wait_timeout: Duration,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(retention)
            .build();

        Self {
            repos,
            clock,
            cache,
            in_flight: DashMap::new(),
            retention,
            wait_timeout,
        }
    }

    /// Runs `execute` unless a result for the same scope and key exists.
    ///
    /// Without a key the operation simply runs. Concurrent duplicates
    /// serialize on the key; the loser observes the winner's stored result.
    pub async fn run<T, F, Fut>(
        &self,
        account: AccountId,
        operation: &str,
        key: Option<&str>,
        execute: F,
    ) -> LedgerResult<IdempotentResult<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        let Some(key) = key else {
            return execute().await.map(IdempotentResult::fresh);
        };
        validate_idempotency_key(key)?;

        let scope = format!("{account}:{operation}");
        let cache_key = format!("{scope}:{key}");

        let lock = Arc::clone(self.in_flight.entry(cache_key.clone()).or_default().value());
        let result = match tokio::time::timeout(self.wait_timeout, lock.lock()).await {
            Ok(_guard) => self.execute_once(&scope, key, &cache_key, execute).await,
            Err(_) => Err(LedgerError::Busy),
        };
        drop(lock);
        self.in_flight
            .remove_if(&cache_key, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn execute_once<T, F, Fut>(
        &self,
        scope: &str,
        key: &str,
        cache_key: &str,
        execute: F,
    ) -> LedgerResult<IdempotentResult<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = LedgerResult<T>>,
    {
        let now = self.clock.now();

        if let Some(record) = self.lookup(scope, key, cache_key, now).await? {
            debug!(scope, key, "replaying idempotent result");
            let value = serde_json::from_value(record.response)
                .map_err(|e| LedgerError::Internal(format!("corrupt idempotency record: {e}")))?;
            return Ok(IdempotentResult {
                value,
                replayed: true,
            });
        }

        let value = execute().await?;

        let response = serde_json::to_value(&value)
            .map_err(|e| LedgerError::Internal(format!("unserializable result: {e}")))?;
        let retention = chrono::Duration::from_std(self.retention)
            .map_err(|e| LedgerError::Internal(e.to_string()))?;
        let record = IdempotencyRecord {
            scope: scope.to_string(),
            key: key.to_string(),
            response,
            created_at: now,
            expires_at: now + retention,
        };

        // The mutation already happened; losing the record only weakens
        // dedup for later retries, so it must not fail the request.
        if let Err(e) = self.repos.idempotency().save_record(&record).await {
            warn!(scope, key, error = %e, "failed to persist idempotency record");
        }
        self.cache.insert(cache_key.to_string(), record).await;

        Ok(IdempotentResult::fresh(value))
    }

    async fn lookup(
        &self,
        scope: &str,
        key: &str,
        cache_key: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<IdempotencyRecord>> {
        if let Some(record) = self.cache.get(cache_key).await {
            if record.expires_at > now {
                return Ok(Some(record));
            }
            self.cache.invalidate(cache_key).await;
        }

        let stored = self.repos.idempotency().find_record(scope, key, now).await?;
        if let Some(record) = &stored {
            self.cache.insert(cache_key.to_string(), record.clone()).await;
        }
        Ok(stored)
    }
}
