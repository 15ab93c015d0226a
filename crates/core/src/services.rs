//! Wiring of the core services over a repository implementation.

use std::sync::Arc;

use pocketbank_shared::config::{LedgerConfig, SchedulerConfig};
use pocketbank_shared::types::Amount;

use crate::account::AccountService;
use crate::auth::{PinHasher, SimplePasswords};
use crate::clock::Clock;
use crate::favorite::FavoriteService;
use crate::guard::{AccountLocks, IdempotencyGuard};
use crate::ledger::{LedgerError, LedgerResult, TransactionHistory};
use crate::notification::{NotificationDispatcher, NotificationService};
use crate::ports::{CredentialVerifier, NotificationSink, Repositories};
use crate::schedule::{ScheduleRunner, ScheduleService};
use crate::statistics::StatisticsService;
use crate::transfer::TransferEngine;

/// Collaborators the services are built on.
pub struct CoreDeps {
    /// Storage.
    pub repos: Arc<dyn Repositories>,
    /// Login password checks.
    pub credentials: Arc<dyn CredentialVerifier>,
    /// Push delivery.
    pub sink: Arc<dyn NotificationSink>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

/// Every core service, sharing one set of locks and one idempotency cache.
#[derive(Clone)]
pub struct CoreServices {
    /// Account lifecycle and simple-password flows.
    pub accounts: Arc<AccountService>,
    /// Money movement.
    pub transfers: Arc<TransferEngine>,
    /// Owner-facing scheduled transfers.
    pub schedules: Arc<ScheduleService>,
    /// Background schedule executor.
    pub runner: Arc<ScheduleRunner>,
    /// Transaction history.
    pub history: Arc<TransactionHistory>,
    /// Monthly statistics.
    pub statistics: Arc<StatisticsService>,
    /// Saved recipients.
    pub favorites: Arc<FavoriteService>,
    /// Notification inbox.
    pub notifications: Arc<NotificationService>,
    /// Notification emitter.
    pub dispatcher: NotificationDispatcher,
    /// Simple-password verification.
    pub pins: Arc<SimplePasswords>,
}

impl CoreServices {
    /// Builds the services.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the Argon2 parameters are invalid.
    pub fn new(
        deps: CoreDeps,
        ledger: &LedgerConfig,
        scheduler: &SchedulerConfig,
    ) -> LedgerResult<Self> {
        let CoreDeps {
            repos,
            credentials,
            sink,
            clock,
        } = deps;

        let hasher = PinHasher::new(ledger.argon2_memory_kib, ledger.argon2_iterations)
            .map_err(|e| LedgerError::Internal(e.to_string()))?;
        let pins = Arc::new(SimplePasswords::new(
            Arc::clone(&repos),
            credentials,
            Arc::clone(&clock),
            hasher,
            ledger.max_password_attempts,
        ));
        let locks = Arc::new(AccountLocks::new(ledger.lock_timeout()));
        let idempotency = Arc::new(IdempotencyGuard::new(
            Arc::clone(&repos),
            Arc::clone(&clock),
            ledger.idempotency_retention(),
            ledger.lock_timeout(),
        ));
        let dispatcher = NotificationDispatcher::new(Arc::clone(&repos), sink, Arc::clone(&clock));

        let transfers = Arc::new(TransferEngine::new(
            Arc::clone(&repos),
            locks,
            Arc::clone(&idempotency),
            Arc::clone(&pins),
            dispatcher.clone(),
            Arc::clone(&clock),
            Amount::new(ledger.max_transfer_amount),
        ));
        let runner = Arc::new(ScheduleRunner::new(
            Arc::clone(&repos),
            Arc::clone(&transfers),
            Arc::clone(&clock),
            scheduler.batch_size,
            scheduler.claim_timeout(),
        ));

        Ok(Self {
            accounts: Arc::new(AccountService::new(
                Arc::clone(&repos),
                Arc::clone(&pins),
                Arc::clone(&clock),
            )),
            schedules: Arc::new(ScheduleService::new(
                Arc::clone(&repos),
                Arc::clone(&pins),
                idempotency,
                Arc::clone(&clock),
            )),
            history: Arc::new(TransactionHistory::new(Arc::clone(&repos))),
            statistics: Arc::new(StatisticsService::new(Arc::clone(&repos), Arc::clone(&clock))),
            favorites: Arc::new(FavoriteService::new(Arc::clone(&repos), Arc::clone(&clock))),
            notifications: Arc::new(NotificationService::new(repos, clock)),
            transfers,
            runner,
            dispatcher,
            pins,
        })
    }
}
