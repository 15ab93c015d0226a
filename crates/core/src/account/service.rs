//! Account lifecycle: opening, lookup, locking and simple-password flows.

use std::sync::Arc;

use pocketbank_shared::types::{AccountNumber, UserId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::auth::SimplePasswords;
use crate::clock::Clock;
use crate::ledger::{Account, AccountStatus, LedgerError, LedgerResult};
use crate::ports::Repositories;

/// How many random account numbers to try before giving up.
const ACCOUNT_NUMBER_ATTEMPTS: usize = 5;

/// Public view of an account owner, for recipient confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountOwner {
    /// Account number.
    pub account_number: AccountNumber,
    /// Owner display name.
    pub owner_name: String,
}

/// Lock state of the caller's account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockStatus {
    /// True if the account is LOCKED.
    pub is_locked: bool,
    /// Consecutive simple-password mismatches so far.
    pub failed_attempts: u32,
}

/// Resolves the account owned by `user`.
pub(crate) async fn require_account(repos: &dyn Repositories, user: UserId) -> LedgerResult<Account> {
    repos
        .accounts()
        .find_by_owner(user)
        .await?
        .ok_or_else(|| LedgerError::AccountNotFound(format!("no account for user {user}")))
}

/// Account operations for the authenticated owner.
pub struct AccountService {
    repos: Arc<dyn Repositories>,
    pins: Arc<SimplePasswords>,
    clock: Arc<dyn Clock>,
}

impl AccountService {
    /// Creates the service.
    #[must_use]
    pub fn new(repos: Arc<dyn Repositories>, pins: Arc<SimplePasswords>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, pins, clock }
    }

    /// Opens the caller's account. Each user has at most one.
    #[instrument(skip(self), err)]
    pub async fn open(&self, user: UserId, owner_name: &str) -> LedgerResult<Account> {
        let owner_name = owner_name.trim();
        if owner_name.is_empty() {
            return Err(LedgerError::validation("owner name is required"));
        }
        if self.repos.accounts().find_by_owner(user).await?.is_some() {
            return Err(LedgerError::Conflict("user already has an account".to_string()));
        }

        for _ in 0..ACCOUNT_NUMBER_ATTEMPTS {
            let number = random_account_number()?;
            if self.repos.accounts().find_by_number(&number).await?.is_some() {
                continue;
            }
            let account = Account::open(user, owner_name, number, self.clock.now());
            match self.repos.accounts().insert_account(&account).await {
                Ok(()) => {
                    info!(account_id = %account.id, "account opened");
                    return Ok(account);
                }
                // Lost a race on the number; the owner check above already passed.
                Err(LedgerError::Conflict(reason)) => {
                    warn!(reason, "account insert conflicted, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Err(LedgerError::Internal(
            "could not allocate a unique account number".to_string(),
        ))
    }

    /// Returns the caller's account.
    pub async fn me(&self, user: UserId) -> LedgerResult<Account> {
        require_account(self.repos.as_ref(), user).await
    }

    /// Resolves an account number to its owner's name.
    pub async fn owner_of(&self, number: &AccountNumber) -> LedgerResult<AccountOwner> {
        let account = self
            .repos
            .accounts()
            .find_by_number(number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(number.to_string()))?;
        Ok(AccountOwner {
            account_number: account.account_number,
            owner_name: account.owner_name,
        })
    }

    /// Locks the caller's account. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn lock(&self, user: UserId) -> LedgerResult<Account> {
        let account = require_account(self.repos.as_ref(), user).await?;
        if account.status == AccountStatus::Locked {
            return Ok(account);
        }
        let locked = self
            .repos
            .accounts()
            .set_status(account.id, AccountStatus::Locked, self.clock.now())
            .await?;
        info!(account_id = %account.id, "account locked by owner");
        Ok(locked)
    }

    /// Unlocks the caller's account after checking the login password.
    #[instrument(skip(self, login_password), err)]
    pub async fn unlock(&self, user: UserId, login_password: &str) -> LedgerResult<Account> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.pins.verify_login_password(&account, login_password).await?;
        let unlocked = self
            .repos
            .accounts()
            .set_status(account.id, AccountStatus::Active, self.clock.now())
            .await?;
        info!(account_id = %account.id, "account unlocked");
        Ok(unlocked)
    }

    /// Returns the caller's lock state.
    pub async fn lock_status(&self, user: UserId) -> LedgerResult<LockStatus> {
        let account = require_account(self.repos.as_ref(), user).await?;
        Ok(LockStatus {
            is_locked: account.status == AccountStatus::Locked,
            failed_attempts: account.failed_password_attempts,
        })
    }

    /// Registers the caller's first simple password.
    #[instrument(skip_all, fields(user = %user), err)]
    pub async fn register_simple_password(
        &self,
        user: UserId,
        login_password: &str,
        pin: &str,
        pin_confirm: &str,
    ) -> LedgerResult<()> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.pins
            .register(&account, login_password, pin, pin_confirm)
            .await
            .map(|_| ())
    }

    /// Changes the caller's simple password.
    #[instrument(skip_all, fields(user = %user), err)]
    pub async fn change_simple_password(
        &self,
        user: UserId,
        current_pin: &str,
        new_pin: &str,
        new_pin_confirm: &str,
    ) -> LedgerResult<()> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.pins
            .change(&account, current_pin, new_pin, new_pin_confirm)
            .await
            .map(|_| ())
    }

    /// Verifies the caller's simple password. Counts toward the lock limit.
    #[instrument(skip_all, fields(user = %user))]
    pub async fn verify_simple_password(&self, user: UserId, pin: &str) -> LedgerResult<()> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.pins.verify(&account, pin).await
    }

    /// Returns true if the caller has registered a simple password.
    pub async fn has_simple_password(&self, user: UserId) -> LedgerResult<bool> {
        let account = require_account(self.repos.as_ref(), user).await?;
        Ok(account.has_simple_password())
    }
}

fn random_account_number() -> LedgerResult<AccountNumber> {
    let value: u64 = rand::rng().random_range(100_000_000_000..1_000_000_000_000);
    AccountNumber::parse(&value.to_string()).map_err(|e| LedgerError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestBank;

    #[tokio::test]
    async fn test_open_allocates_twelve_digit_number() {
        let bank = TestBank::new();
        let user = UserId::new();

        let account = bank.services.accounts.open(user, " Kim ").await.unwrap();

        assert_eq!(account.account_number.digits().len(), 12);
        assert_eq!(account.owner_name, "Kim");
        assert_eq!(account.balance.value(), 0);
        assert_eq!(account.status, AccountStatus::Active);
        assert_eq!(bank.services.accounts.me(user).await.unwrap(), account);
    }

    #[tokio::test]
    async fn test_one_account_per_user() {
        let bank = TestBank::new();
        let user = UserId::new();
        bank.services.accounts.open(user, "Kim").await.unwrap();

        let second = bank.services.accounts.open(user, "Kim").await;
        assert!(matches!(second, Err(LedgerError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_owner_lookup() {
        let bank = TestBank::new();
        let (_, account) = bank.open_account("Lee", 0).await;

        let owner = bank.services.accounts.owner_of(&account.account_number).await.unwrap();
        assert_eq!(owner.owner_name, "Lee");

        let missing = AccountNumber::parse("000000000001").unwrap();
        assert!(matches!(
            bank.services.accounts.owner_of(&missing).await,
            Err(LedgerError::AccountNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_lock_and_unlock() {
        let bank = TestBank::new();
        let (user, _) = bank.open_account("Kim", 0).await;
        let accounts = &bank.services.accounts;

        accounts.lock(user).await.unwrap();
        assert!(accounts.lock_status(user).await.unwrap().is_locked);

        let wrong = accounts.unlock(user, "nope").await;
        assert!(matches!(wrong, Err(LedgerError::Forbidden(_))));
        assert!(accounts.lock_status(user).await.unwrap().is_locked);

        accounts.unlock(user, &TestBank::login_password(user)).await.unwrap();
        assert!(!accounts.lock_status(user).await.unwrap().is_locked);
    }

    #[tokio::test]
    async fn test_unlock_clears_pin_failures() {
        let bank = TestBank::new();
        let (user, _) = bank.open_account("Kim", 0).await;
        let accounts = &bank.services.accounts;

        for _ in 0..5 {
            let _ = accounts.verify_simple_password(user, "000000").await;
        }
        let status = accounts.lock_status(user).await.unwrap();
        assert!(status.is_locked);
        assert_eq!(status.failed_attempts, 5);

        accounts.unlock(user, &TestBank::login_password(user)).await.unwrap();
        let status = accounts.lock_status(user).await.unwrap();
        assert!(!status.is_locked);
        assert_eq!(status.failed_attempts, 0);
        accounts.verify_simple_password(user, TestBank::PIN).await.unwrap();
    }

    #[tokio::test]
    async fn test_simple_password_status() {
        let bank = TestBank::new();
        let (user, _) = bank.open_account_without_pin("Kim").await;
        let accounts = &bank.services.accounts;

        assert!(!accounts.has_simple_password(user).await.unwrap());
        accounts
            .register_simple_password(user, &TestBank::login_password(user), "135790", "135790")
            .await
            .unwrap();
        assert!(accounts.has_simple_password(user).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_without_account() {
        let bank = TestBank::new();
        assert!(matches!(
            bank.services.accounts.me(UserId::new()).await,
            Err(LedgerError::AccountNotFound(_))
        ));
    }
}
