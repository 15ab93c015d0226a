//! Database seeder for Pocketbank development and testing.
//!
//! Opens two accounts with fixed owner ids, registers the PIN `123456` on
//! both, credits an opening balance and prints a bearer token for each so
//! the API can be exercised by hand.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use pocketbank_core::ledger::{LedgerResult, TransactionType};
use pocketbank_core::notification::LoggingSink;
use pocketbank_core::ports::{CredentialVerifier, DepositCommand, Repositories};
use pocketbank_core::{Clock, CoreDeps, CoreServices, SystemClock};
use pocketbank_db::{SeaStore, connect};
use pocketbank_shared::types::{Amount, UserId};
use pocketbank_shared::{AppConfig, JwtConfig, JwtService};
use uuid::Uuid;

/// Seed users: (owner id, display name, opening balance).
const SEED_USERS: [(u128, &str, i64); 2] = [
    (0x0000_0000_0000_7000_8000_0000_0000_0001, "Kim Minji", 1_000_000),
    (0x0000_0000_0000_7000_8000_0000_0000_0002, "Lee Jiho", 250_000),
];

const SEED_PIN: &str = "123456";

/// Accepts any login password. The auth service is not running while
/// seeding, and the seeded owners never log in with a password here.
struct SeedCredentials;

#[async_trait]
impl CredentialVerifier for SeedCredentials {
    async fn verify_login_password(&self, _user: UserId, _password: &str) -> LedgerResult<bool> {
        Ok(true)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;

    println!("Connecting to database...");
    let db = connect(&config.database).await.context("failed to connect to database")?;
    let store = Arc::new(SeaStore::new(db));
    let clock = Arc::new(SystemClock);
    let services = CoreServices::new(
        CoreDeps {
            repos: store.clone(),
            credentials: Arc::new(SeedCredentials),
            sink: Arc::new(LoggingSink),
            clock: clock.clone(),
        },
        &config.ledger,
        &config.scheduler,
    )?;
    let jwt = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: 60 * 24,
    });

    for (raw_id, name, balance) in SEED_USERS {
        let user = UserId::from_uuid(Uuid::from_u128(raw_id));
        println!("Seeding {name}...");

        if let Some(existing) = store.accounts().find_by_owner(user).await? {
            println!("  Account {} already exists, skipping...", existing.account_number);
        } else {
            let account = services.accounts.open(user, name).await?;
            services
                .accounts
                .register_simple_password(user, "seed", SEED_PIN, SEED_PIN)
                .await?;
            store
                .ledger()
                .apply_deposit(&DepositCommand {
                    tx_type: TransactionType::Deposit,
                    account: account.id,
                    amount: Amount::new(balance),
                    description: "opening balance".to_string(),
                    now: clock.now(),
                })
                .await?;
            println!("  Opened {} with {} won", account.account_number, balance);
        }

        println!("  Token: {}", jwt.issue_token(user, name)?);
    }

    println!("Seeding complete!");
    Ok(())
}
