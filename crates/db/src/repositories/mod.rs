//! Repository implementations of the core ports.
//!
//! [`SeaStore`] implements every port on one connection pool. Multi-row
//! mutations run inside a database transaction; account rows are read with
//! `SELECT ... FOR UPDATE` in ascending id order and written back with a
//! version check, and every state transition is a conditional update.

mod account;
mod favorite;
mod idempotency;
mod ledger;
mod notification;
mod qr_payment;
mod schedule;

use pocketbank_core::ports::{
    AccountRepository, FavoriteRepository, IdempotencyRepository, LedgerStore,
    NotificationRepository, QrPaymentRepository, Repositories, ScheduleRepository,
};
use pocketbank_core::{LedgerError, LedgerResult};
use pocketbank_shared::types::PageRequest;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Select, SqlErr,
};
use tracing::error;

/// SeaORM-backed repositories.
#[derive(Debug, Clone)]
pub struct SeaStore {
    db: DatabaseConnection,
}

impl SeaStore {
    /// Creates a store on an existing connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl Repositories for SeaStore {
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

/// Maps a database error into the ledger's storage error.
pub(crate) fn storage(err: DbErr) -> LedgerError {
    error!(error = %err, "database error");
    LedgerError::Storage(err.to_string())
}

/// Maps a unique-constraint violation to `Conflict`, anything else to
/// `Storage`.
pub(crate) fn conflict_or_storage(err: DbErr, what: &str) -> LedgerError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        LedgerError::Conflict(format!("{what} already exists"))
    } else {
        storage(err)
    }
}

/// Fetches one page of `query` plus the total row count.
pub(crate) async fn fetch_page<E, C>(
    conn: &C,
    query: Select<E>,
    page: PageRequest,
) -> LedgerResult<(Vec<E::Model>, u64)>
where
    E: EntityTrait,
    E::Model: Sync + 'static,
    C: ConnectionTrait,
{
    let paginator = query.paginate(conn, page.limit());
    let total = paginator.num_items().await.map_err(storage)?;
    let rows = paginator
        .fetch_page(u64::from(page.page))
        .await
        .map_err(storage)?;
    Ok((rows, total))
}
