//! Shared fixtures for repository integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pocketbank_core::clock::{Clock, ManualClock};
use pocketbank_core::ledger::{Account, TransactionType};
use pocketbank_core::ports::{DepositCommand, Repositories};
use pocketbank_core::testing::{RecordingSink, StubCredentials, TestBank};
use pocketbank_core::{CoreDeps, CoreServices};
use pocketbank_db::SeaStore;
use pocketbank_db::migration::{Migrator, MigratorTrait};
use pocketbank_shared::config::{LedgerConfig, SchedulerConfig};
use pocketbank_shared::types::{AccountId, Amount, UserId};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

/// Fresh in-memory SQLite database with every migration applied.
pub async fn database() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(options).await.expect("connect sqlite");
    Migrator::up(&db, None).await.expect("migrate");
    db
}

/// Core services running on a [`SeaStore`].
pub struct SqlBank {
    pub store: Arc<SeaStore>,
    pub clock: Arc<ManualClock>,
    pub sink: Arc<RecordingSink>,
    pub services: CoreServices,
}

impl SqlBank {
    pub async fn new() -> Self {
        let store = Arc::new(SeaStore::new(database().await));
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap(),
        ));
        let sink = Arc::new(RecordingSink::default());
        let services = CoreServices::new(
            CoreDeps {
                repos: store.clone(),
                credentials: Arc::new(StubCredentials),
                sink: sink.clone(),
                clock: clock.clone(),
            },
            &LedgerConfig {
                argon2_memory_kib: 8,
                argon2_iterations: 1,
                ..LedgerConfig::default()
            },
            &SchedulerConfig::default(),
        )
        .expect("services");
        Self {
            store,
            clock,
            sink,
            services,
        }
    }

    /// Opens an account with the test PIN and an opening balance.
    pub async fn open_account(&self, name: &str, balance: i64) -> (UserId, Account) {
        let user = UserId::new();
        let account = self.services.accounts.open(user, name).await.expect("open");
        self.services
            .accounts
            .register_simple_password(user, &TestBank::login_password(user), TestBank::PIN, TestBank::PIN)
            .await
            .expect("register PIN");
        if balance > 0 {
            self.store
                .ledger()
                .apply_deposit(&DepositCommand {
                    tx_type: TransactionType::Deposit,
                    account: account.id,
                    amount: Amount::new(balance),
                    description: "opening balance".to_string(),
                    now: self.clock.now(),
                })
                .await
                .expect("deposit");
        }
        (user, self.reload(account.id).await)
    }

    pub async fn reload(&self, id: AccountId) -> Account {
        self.store
            .accounts()
            .find_account(id)
            .await
            .expect("find account")
            .expect("account exists")
    }

    pub async fn balance(&self, id: AccountId) -> i64 {
        self.reload(id).await.balance.value()
    }
}
