//! Port traits for data repositories.
//!
//! These traits define the storage interface used by the domain layer.
//! Implementations live in `pocketbank-db` (SeaORM) and in
//! [`crate::memory::MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use pocketbank_shared::types::{
    AccountId, AccountNumber, Amount, FavoriteId, NotificationId, PageRequest, PageResponse,
    QrPaymentId, ScheduleId, TransactionId, UserId,
};

use crate::favorite::Favorite;
use crate::guard::IdempotencyRecord;
use crate::ledger::{Account, AccountStatus, LedgerResult, Transaction, TransactionType};
use crate::notification::Notification;
use crate::qr::QrPaymentIntent;
use crate::schedule::ScheduledTransfer;

// =============================================================================
// Commands
// =============================================================================

/// The subject settled in the same atomic unit as a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Plain transfer.
    None,
    /// QR intent flips PENDING -> PAID; fails with `QrAlreadyUsed` or
    /// `QrExpired` if it cannot.
    Qr(QrPaymentId),
    /// Claimed schedule flips EXECUTING -> EXECUTED (or FAILED for a failure
    /// record); fails with `ScheduleNotPending` if it cannot.
    Schedule(ScheduleId),
}

/// A two-account balance move.
#[derive(Debug, Clone)]
pub struct TransferCommand {
    /// Type recorded on the transaction.
    pub tx_type: TransactionType,
    /// Debited account.
    pub from: AccountId,
    /// Credited account.
    pub to: AccountId,
    /// Positive amount.
    pub amount: Amount,
    /// Description.
    pub description: String,
    /// Subject settled with the posting.
    pub settlement: Settlement,
    /// Posting time.
    pub now: DateTime<Utc>,
}

/// A single-account credit.
#[derive(Debug, Clone)]
pub struct DepositCommand {
    /// `Deposit` or `SelfDeposit`.
    pub tx_type: TransactionType,
    /// Credited account.
    pub account: AccountId,
    /// Positive amount.
    pub amount: Amount,
    /// Description.
    pub description: String,
    /// Posting time.
    pub now: DateTime<Utc>,
}

/// A mutation attempt rejected after the locks were held.
#[derive(Debug, Clone)]
pub struct FailureRecord {
    /// Type of the attempted transaction.
    pub tx_type: TransactionType,
    /// Originating account.
    pub from: AccountId,
    /// Counterparty, if resolved.
    pub to: Option<AccountId>,
    /// Attempted amount.
    pub amount: Amount,
    /// Description.
    pub description: String,
    /// Machine code (see `LedgerError::error_code`).
    pub reason: String,
    /// `Schedule` flips EXECUTING -> FAILED with the row; `Qr` is only
    /// back-referenced.
    pub settlement: Settlement,
    /// Attempt time.
    pub now: DateTime<Utc>,
}

// =============================================================================
// Filter Types
// =============================================================================

/// Filter options for transaction history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    /// Only this type.
    pub tx_type: Option<TransactionType>,
    /// Inclusive start date (UTC).
    pub start_date: Option<NaiveDate>,
    /// Inclusive end date (UTC).
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    /// Start of the window as an instant.
    #[must_use]
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.start_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Exclusive end of the window as an instant.
    #[must_use]
    pub fn ends_before(&self) -> Option<DateTime<Utc>> {
        self.end_date
            .and_then(|d| d.succ_opt())
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// Returns true if `tx` passes the type and date criteria.
    #[must_use]
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.tx_type.is_none_or(|t| t == tx.tx_type)
            && self.starts_at().is_none_or(|s| tx.created_at >= s)
            && self.ends_before().is_none_or(|e| tx.created_at < e)
    }
}

// =============================================================================
// Repository Traits
// =============================================================================

/// Repository for accounts.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account. `Conflict` if the owner already has one or the
    /// number is taken.
    async fn insert_account(&self, account: &Account) -> LedgerResult<()>;

    /// Get account by ID.
    async fn find_account(&self, id: AccountId) -> LedgerResult<Option<Account>>;

    /// Get the account owned by a user.
    async fn find_by_owner(&self, owner: UserId) -> LedgerResult<Option<Account>>;

    /// Get account by number.
    async fn find_by_number(&self, number: &AccountNumber) -> LedgerResult<Option<Account>>;

    /// Set the status. Moving to ACTIVE also clears the PIN failure counter.
    async fn set_status(
        &self,
        id: AccountId,
        status: AccountStatus,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account>;

    /// Store a new simple-password verifier, bump `credential_version` and
    /// clear the failure counter.
    async fn set_simple_password(
        &self,
        id: AccountId,
        hash: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account>;

    /// Atomically count one PIN mismatch; the account becomes LOCKED when the
    /// counter reaches `max_attempts`.
    async fn record_password_failure(
        &self,
        id: AccountId,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account>;

    /// Clear the PIN failure counter.
    async fn reset_password_failures(&self, id: AccountId, now: DateTime<Utc>) -> LedgerResult<()>;
}

/// The ledger: balances and append-only transactions.
///
/// Every method is one atomic unit. Callers hold the per-account locks
/// around `apply_*` and `record_failure`.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Move money between two accounts and settle the subject.
    ///
    /// Fails with `AccountNotFound`, `AccountLocked`, `InsufficientFunds`, or
    /// the settlement's error, leaving everything unchanged.
    async fn apply_transfer(&self, command: &TransferCommand) -> LedgerResult<Transaction>;

    /// Credit a single account.
    async fn apply_deposit(&self, command: &DepositCommand) -> LedgerResult<Transaction>;

    /// Append a FAILED transaction (and fail a claimed schedule).
    async fn record_failure(&self, record: &FailureRecord) -> LedgerResult<Transaction>;

    /// Get transaction by ID.
    async fn find_transaction(&self, id: TransactionId) -> LedgerResult<Option<Transaction>>;

    /// List the history visible to `account`, newest first.
    async fn list_transactions(
        &self,
        account: AccountId,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Transaction>>;

    /// COMPLETED transactions involving `account` in `[from, until)`.
    async fn completed_between(
        &self,
        account: AccountId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>>;
}

/// Repository for QR payment intents.
#[async_trait]
pub trait QrPaymentRepository: Send + Sync {
    /// Insert a new intent.
    async fn insert_intent(&self, intent: &QrPaymentIntent) -> LedgerResult<()>;

    /// Get intent by code.
    async fn find_by_code(&self, code: &str) -> LedgerResult<Option<QrPaymentIntent>>;

    /// Get intent by ID.
    async fn find_intent(&self, id: QrPaymentId) -> LedgerResult<Option<QrPaymentIntent>>;

    /// CAS PENDING -> EXPIRED if past expiry. Returns true if flipped.
    async fn expire_intent(&self, id: QrPaymentId, now: DateTime<Utc>) -> LedgerResult<bool>;
}

/// Repository for scheduled transfers.
///
/// Every state change is a single conditional update.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Insert a new PENDING schedule.
    async fn insert_schedule(&self, schedule: &ScheduledTransfer) -> LedgerResult<()>;

    /// Get schedule by ID.
    async fn find_schedule(&self, id: ScheduleId) -> LedgerResult<Option<ScheduledTransfer>>;

    /// List an account's schedules, newest first.
    async fn list_schedules(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<ScheduledTransfer>>;

    /// PENDING schedules due at `now`, oldest due first.
    async fn find_due(&self, now: DateTime<Utc>, limit: u64) -> LedgerResult<Vec<ScheduledTransfer>>;

    /// CAS PENDING -> EXECUTING. Returns true if this caller won the claim.
    async fn claim(&self, id: ScheduleId, now: DateTime<Utc>) -> LedgerResult<bool>;

    /// CAS EXECUTING -> PENDING, giving a claim back after a retryable error.
    async fn release_claim(&self, id: ScheduleId) -> LedgerResult<bool>;

    /// CAS PENDING -> CANCELLED for the owner.
    async fn cancel(&self, id: ScheduleId, owner: AccountId) -> LedgerResult<bool>;

    /// CAS EXECUTING -> FAILED without a ledger row.
    async fn mark_failed(&self, id: ScheduleId, reason: &str, now: DateTime<Utc>) -> LedgerResult<bool>;

    /// Reset EXECUTING claims taken before `claimed_before` back to PENDING.
    async fn release_stale_claims(&self, claimed_before: DateTime<Utc>) -> LedgerResult<u64>;
}

/// Repository for notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification.
    async fn insert_notification(&self, notification: &Notification) -> LedgerResult<()>;

    /// Get notification by ID.
    async fn find_notification(&self, id: NotificationId) -> LedgerResult<Option<Notification>>;

    /// List an account's notifications, newest first.
    async fn list_notifications(
        &self,
        account: AccountId,
        unread_only: bool,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Notification>>;

    /// Count unread notifications.
    async fn count_unread(&self, account: AccountId) -> LedgerResult<u64>;

    /// Mark one notification read. Returns false if it is not the account's.
    async fn mark_read(&self, id: NotificationId, account: AccountId, now: DateTime<Utc>) -> LedgerResult<bool>;

    /// Mark all unread notifications read. Returns how many changed.
    async fn mark_all_read(&self, account: AccountId, now: DateTime<Utc>) -> LedgerResult<u64>;

    /// Delete one notification. Returns false if it is not the account's.
    async fn delete_notification(&self, id: NotificationId, account: AccountId) -> LedgerResult<bool>;

    /// Delete all read notifications. Returns how many were removed.
    async fn delete_read(&self, account: AccountId) -> LedgerResult<u64>;
}

/// Repository for favorites.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Insert a favorite. `Conflict` if the owner already saved that number.
    async fn insert_favorite(&self, favorite: &Favorite) -> LedgerResult<()>;

    /// Get favorite by ID.
    async fn find_favorite(&self, id: FavoriteId) -> LedgerResult<Option<Favorite>>;

    /// List an account's favorites, newest first.
    async fn list_favorites(&self, account: AccountId) -> LedgerResult<Vec<Favorite>>;

    /// Overwrite nickname and memo.
    async fn update_favorite(&self, favorite: &Favorite) -> LedgerResult<()>;

    /// Delete a favorite. Returns false if it is not the account's.
    async fn delete_favorite(&self, id: FavoriteId, account: AccountId) -> LedgerResult<bool>;
}

/// Repository for idempotency records.
#[async_trait]
pub trait IdempotencyRepository: Send + Sync {
    /// Get an unexpired record.
    async fn find_record(
        &self,
        scope: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<IdempotencyRecord>>;

    /// Store a record, replacing an expired one with the same key.
    async fn save_record(&self, record: &IdempotencyRecord) -> LedgerResult<()>;

    /// Delete records expired at `now`. Returns how many were removed.
    async fn purge_expired(&self, now: DateTime<Utc>) -> LedgerResult<u64>;
}

// =============================================================================
// Composite Repository
// =============================================================================

/// Combined repository access for the services.
pub trait Repositories: Send + Sync {
    /// Access the account repository.
    fn accounts(&self) -> &dyn AccountRepository;

    /// Access the ledger store.
    fn ledger(&self) -> &dyn LedgerStore;

    /// Access the QR intent repository.
    fn qr_payments(&self) -> &dyn QrPaymentRepository;

    /// Access the schedule repository.
    fn schedules(&self) -> &dyn ScheduleRepository;

    /// Access the notification repository.
    fn notifications(&self) -> &dyn NotificationRepository;

    /// Access the favorite repository.
    fn favorites(&self) -> &dyn FavoriteRepository;

    /// Access the idempotency repository.
    fn idempotency(&self) -> &dyn IdempotencyRepository;
}
