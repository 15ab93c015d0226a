//! Idempotency and concurrency guard.
//!
//! - [`AccountLocks`]: per-account exclusive locks, always acquired in
//!   ascending `AccountId` order, bounded by a timeout that fails with `Busy`
//! - [`IdempotencyGuard`]: per-(account, operation, key) dedup with a
//!   persisted result and an in-process replay cache

mod idempotency;
mod locks;

pub use idempotency::{IdempotencyGuard, IdempotencyRecord, IdempotentResult};
pub use locks::{AccountLockGuard, AccountLocks};
