//! In-process implementation of every repository port.
//!
//! One async mutex guards the whole state, so each trait method is trivially
//! atomic. Used by tests and by single-node deployments without a database.

mod ledger;
mod records;

use std::collections::HashMap;

use pocketbank_shared::types::{
    AccountId, Amount, PageRequest, PageResponse, QrPaymentId,
};
use tokio::sync::Mutex;

use crate::favorite::Favorite;
use crate::guard::IdempotencyRecord;
use crate::ledger::{Account, Transaction};
use crate::notification::Notification;
use crate::ports::{
    AccountRepository, FavoriteRepository, IdempotencyRepository, LedgerStore,
    NotificationRepository, QrPaymentRepository, Repositories, ScheduleRepository,
};
use crate::qr::QrPaymentIntent;
use crate::schedule::ScheduledTransfer;

#[derive(Debug, Default)]
struct State {
    accounts: HashMap<AccountId, Account>,
    transactions: Vec<Transaction>,
    qr_payments: HashMap<QrPaymentId, QrPaymentIntent>,
    schedules: Vec<ScheduledTransfer>,
    notifications: Vec<Notification>,
    favorites: Vec<Favorite>,
    idempotency: HashMap<(String, String), IdempotencyRecord>,
}

/// Repositories backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every transaction, in posting order.
    pub async fn all_transactions(&self) -> Vec<Transaction> {
        self.state.lock().await.transactions.clone()
    }

    /// Sum of all balances.
    pub async fn total_balance(&self) -> Amount {
        self.state
            .lock()
            .await
            .accounts
            .values()
            .map(|a| a.balance)
            .sum()
    }

    /// An account's notifications, newest first.
    pub async fn notifications_of(&self, account: AccountId) -> Vec<Notification> {
        let state = self.state.lock().await;
        newest_first(
            state
                .notifications
                .iter()
                .filter(|n| n.account_id == account)
                .cloned()
                .collect(),
            |n| n.created_at,
        )
    }
}

impl Repositories for MemoryStore {
    fn accounts(&self) -> &dyn AccountRepository {
        self
    }

    fn ledger(&self) -> &dyn LedgerStore {
        self
    }

    fn qr_payments(&self) -> &dyn QrPaymentRepository {
        self
    }

    fn schedules(&self) -> &dyn ScheduleRepository {
        self
    }

    fn notifications(&self) -> &dyn NotificationRepository {
        self
    }

    fn favorites(&self) -> &dyn FavoriteRepository {
        self
    }

    fn idempotency(&self) -> &dyn IdempotencyRepository {
        self
    }
}

/// Sorts newest first; ties keep the later insertion first.
fn newest_first<T, K: Ord>(mut items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    items.reverse();
    items.sort_by(|a, b| key(b).cmp(&key(a)));
    items
}

/// Cuts one page out of an already ordered list.
fn paginate<T>(items: Vec<T>, request: PageRequest) -> PageResponse<T> {
    let total = items.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(request.limit()).unwrap_or(usize::MAX);
    let content = items.into_iter().skip(offset).take(limit).collect();
    PageResponse::new(content, request, total)
}
