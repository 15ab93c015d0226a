//! Test fixtures: an in-memory bank with stub collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pocketbank_shared::config::{LedgerConfig, SchedulerConfig};
use pocketbank_shared::types::{AccountId, Amount, PageRequest, PageResponse, TransactionId, UserId};

use crate::clock::{Clock, ManualClock};
use crate::ledger::{Account, LedgerError, LedgerResult, Transaction, TransactionType};
use crate::memory::MemoryStore;
use crate::notification::Notification;
use crate::ports::{
    AccountRepository, CredentialVerifier, DepositCommand, FailureRecord, FavoriteRepository,
    IdempotencyRepository, LedgerStore, NotificationRepository, NotificationSink,
    QrPaymentRepository, Repositories, ScheduleRepository, TransactionFilter, TransferCommand,
};
use crate::services::{CoreDeps, CoreServices};

/// Accepts `pw-{user_id}` as every user's login password.
#[derive(Debug, Default)]
pub struct StubCredentials;

#[async_trait]
impl CredentialVerifier for StubCredentials {
    async fn verify_login_password(&self, user: UserId, password: &str) -> LedgerResult<bool> {
        Ok(password == TestBank::login_password(user))
    }
}

/// Remembers every delivered notification.
#[derive(Debug, Default)]
pub struct RecordingSink {
    delivered: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    /// Notifications delivered so far.
    #[must_use]
    pub fn delivered(&self) -> Vec<Notification> {
        self.delivered
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn deliver(&self, notification: &Notification) -> LedgerResult<()> {
        if let Ok(mut delivered) = self.delivered.lock() {
            delivered.push(notification.clone());
        }
        Ok(())
    }
}

/// A [`MemoryStore`] whose postings can be made to fail on demand.
///
/// While a fault is set, `apply_transfer` and `apply_deposit` return it
/// without touching the store. Everything else passes through.
#[derive(Debug)]
pub struct FaultyStore {
    inner: Arc<MemoryStore>,
    fault: Mutex<Option<LedgerError>>,
    postings: AtomicUsize,
}

impl FaultyStore {
    /// Wraps `inner` with no fault set.
    #[must_use]
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            fault: Mutex::new(None),
            postings: AtomicUsize::new(0),
        }
    }

    /// Sets (or clears) the error every posting fails with.
    pub fn fail_postings_with(&self, fault: Option<LedgerError>) {
        if let Ok(mut current) = self.fault.lock() {
            *current = fault;
        }
    }

    /// Posting attempts seen so far, failed or not.
    #[must_use]
    pub fn posting_attempts(&self) -> usize {
        self.postings.load(Ordering::SeqCst)
    }

    fn check_fault(&self) -> LedgerResult<()> {
        self.postings.fetch_add(1, Ordering::SeqCst);
        match self.fault.lock().ok().and_then(|f| f.clone()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerStore for FaultyStore {
    async fn apply_transfer(&self, command: &TransferCommand) -> LedgerResult<Transaction> {
        self.check_fault()?;
        self.inner.apply_transfer(command).await
    }

    async fn apply_deposit(&self, command: &DepositCommand) -> LedgerResult<Transaction> {
        self.check_fault()?;
        self.inner.apply_deposit(command).await
    }

    async fn record_failure(&self, record: &FailureRecord) -> LedgerResult<Transaction> {
        self.inner.record_failure(record).await
    }

    async fn find_transaction(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        self.inner.find_transaction(id).await
    }

    async fn list_transactions(
        &self,
        account: AccountId,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Transaction>> {
        self.inner.list_transactions(account, filter, page).await
    }

    async fn completed_between(
        &self,
        account: AccountId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>> {
        self.inner.completed_between(account, from, until).await
    }
}

impl Repositories for FaultyStore {
    fn accounts(&self) -> &dyn AccountRepository {
        self.inner.as_ref()
    }

    fn ledger(&self) -> &dyn LedgerStore {
        self
    }

    fn qr_payments(&self) -> &dyn QrPaymentRepository {
        self.inner.as_ref()
    }

    fn schedules(&self) -> &dyn ScheduleRepository {
        self.inner.as_ref()
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        self.inner.as_ref()
    }

    fn favorites(&self) -> &dyn FavoriteRepository {
        self.inner.as_ref()
    }

    fn idempotency(&self) -> &dyn IdempotencyRepository {
        self.inner.as_ref()
    }
}

/// A bank on a [`MemoryStore`] with a hand-driven clock.
pub struct TestBank {
    /// Backing store.
    pub store: Arc<MemoryStore>,
    /// The repositories the services run on: `store` plus posting faults.
    pub faults: Arc<FaultyStore>,
    /// Clock shared by every service; starts at 2025-05-01 09:00 UTC.
    pub clock: Arc<ManualClock>,
    /// Delivery sink.
    pub sink: Arc<RecordingSink>,
    /// The services.
    pub services: CoreServices,
    /// Shortcut to `services.pins`.
    pub pins: Arc<crate::auth::SimplePasswords>,
}

impl Default for TestBank {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBank {
    /// Simple password registered by [`TestBank::open_account`].
    pub const PIN: &'static str = "123456";

    /// A bank with default policy and cheap Argon2 parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&LedgerConfig {
            argon2_memory_kib: 8,
            argon2_iterations: 1,
            ..LedgerConfig::default()
        })
    }

    /// A bank with the given ledger policy.
    ///
    /// # Panics
    ///
    /// Panics if the Argon2 parameters are invalid.
    #[must_use]
    pub fn with_config(ledger: &LedgerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let faults = Arc::new(FaultyStore::new(Arc::clone(&store)));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0)
                .single()
                .unwrap_or_default(),
        ));
        let sink = Arc::new(RecordingSink::default());
        let services = CoreServices::new(
            CoreDeps {
                repos: faults.clone(),
                credentials: Arc::new(StubCredentials),
                sink: sink.clone(),
                clock: clock.clone(),
            },
            ledger,
            &SchedulerConfig::default(),
        )
        .expect("test services");
        let pins = Arc::clone(&services.pins);
        Self {
            store,
            faults,
            clock,
            sink,
            services,
            pins,
        }
    }

    /// The login password [`StubCredentials`] accepts for `user`.
    #[must_use]
    pub fn login_password(user: UserId) -> String {
        format!("pw-{user}")
    }

    /// Opens an account with [`TestBank::PIN`] registered and `balance`
    /// deposited.
    ///
    /// # Panics
    ///
    /// Panics if any step fails.
    pub async fn open_account(&self, name: &str, balance: i64) -> (UserId, Account) {
        let (user, account) = self.open_account_without_pin(name).await;
        self.pins
            .register(&account, &Self::login_password(user), Self::PIN, Self::PIN)
            .await
            .expect("register PIN");
        if balance > 0 {
            self.deposit(account.id, balance).await;
        }
        (user, self.reload(account.id).await)
    }

    /// Opens an empty account without a simple password.
    ///
    /// # Panics
    ///
    /// Panics if opening fails.
    pub async fn open_account_without_pin(&self, name: &str) -> (UserId, Account) {
        let user = UserId::new();
        let account = self
            .services
            .accounts
            .open(user, name)
            .await
            .expect("open account");
        (user, account)
    }

    /// Credits an account with a plain DEPOSIT (no notification).
    ///
    /// # Panics
    ///
    /// Panics if the deposit fails.
    pub async fn deposit(&self, account: AccountId, amount: i64) {
        self.store
            .ledger()
            .apply_deposit(&DepositCommand {
                tx_type: TransactionType::Deposit,
                account,
                amount: Amount::new(amount),
                description: "opening balance".to_string(),
                now: self.clock.now(),
            })
            .await
            .expect("deposit");
    }

    /// Current state of an account.
    ///
    /// # Panics
    ///
    /// Panics if the account does not exist.
    pub async fn reload(&self, id: AccountId) -> Account {
        self.store
            .accounts()
            .find_account(id)
            .await
            .expect("find account")
            .expect("account exists")
    }

    /// Current balance of an account.
    pub async fn balance(&self, id: AccountId) -> i64 {
        self.reload(id).await.balance.value()
    }
}
