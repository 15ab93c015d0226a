//! Simple-password (6-digit PIN) verification and lifecycle.

use std::sync::Arc;

use tracing::{info, warn};

use super::hasher::PinHasher;
use crate::clock::Clock;
use crate::ledger::validation::validate_simple_password;
use crate::ledger::{Account, AccountStatus, LedgerError, LedgerResult};
use crate::ports::{CredentialVerifier, Repositories};

/// Verifies simple passwords and counts consecutive mismatches.
pub struct SimplePasswords {
    repos: Arc<dyn Repositories>,
    credentials: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
    hasher: PinHasher,
    max_attempts: u32,
}

impl std::fmt::Debug for SimplePasswords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplePasswords")
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl SimplePasswords {
    /// Creates the service. `max_attempts` consecutive mismatches lock the
    /// account.
    #[must_use]
    pub fn new(
        repos: Arc<dyn Repositories>,
        credentials: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
        hasher: PinHasher,
        max_attempts: u32,
    ) -> Self {
        Self {
            repos,
            credentials,
            clock,
            hasher,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Verifies `pin` for `account`.
    ///
    /// A mismatch is counted atomically; the mismatch that reaches the limit
    /// locks the account and reports zero remaining attempts. A match clears
    /// the counter.
    pub async fn verify(&self, account: &Account, pin: &str) -> LedgerResult<()> {
        validate_simple_password(pin)?;
        if account.status == AccountStatus::Locked {
            return Err(LedgerError::AccountLocked);
        }
        let hash = account
            .simple_password_hash
            .clone()
            .ok_or(LedgerError::SimplePasswordNotSet)?;

        if self.check(pin, hash).await? {
            if account.failed_password_attempts > 0 {
                self.repos
                    .accounts()
                    .reset_password_failures(account.id, self.clock.now())
                    .await?;
            }
            return Ok(());
        }

        let updated = self
            .repos
            .accounts()
            .record_password_failure(account.id, self.max_attempts, self.clock.now())
            .await?;
        let remaining_attempts = self.max_attempts.saturating_sub(updated.failed_password_attempts);
        if updated.status == AccountStatus::Locked {
            warn!(account_id = %account.id, "account locked after repeated simple password mismatches");
        }
        Err(LedgerError::SimplePasswordMismatch { remaining_attempts })
    }

    /// Registers the first simple password. Requires the login password.
    pub async fn register(
        &self,
        account: &Account,
        login_password: &str,
        pin: &str,
        pin_confirm: &str,
    ) -> LedgerResult<Account> {
        if account.has_simple_password() {
            return Err(LedgerError::Conflict(
                "simple password is already registered".to_string(),
            ));
        }
        validate_new_pin(pin, pin_confirm)?;
        self.verify_login_password(account, login_password).await?;

        let hash = self.hash(pin).await?;
        let updated = self
            .repos
            .accounts()
            .set_simple_password(account.id, &hash, self.clock.now())
            .await?;
        info!(account_id = %account.id, "simple password registered");
        Ok(updated)
    }

    /// Replaces the simple password after verifying the current one.
    ///
    /// Bumps the credential version, which invalidates pending scheduled
    /// transfers created under the old PIN.
    pub async fn change(
        &self,
        account: &Account,
        current_pin: &str,
        new_pin: &str,
        new_pin_confirm: &str,
    ) -> LedgerResult<Account> {
        validate_new_pin(new_pin, new_pin_confirm)?;
        self.verify(account, current_pin).await?;

        let hash = self.hash(new_pin).await?;
        let updated = self
            .repos
            .accounts()
            .set_simple_password(account.id, &hash, self.clock.now())
            .await?;
        info!(account_id = %account.id, credential_version = updated.credential_version, "simple password changed");
        Ok(updated)
    }

    /// Checks the login password with the auth service.
    pub async fn verify_login_password(&self, account: &Account, password: &str) -> LedgerResult<()> {
        if password.is_empty() {
            return Err(LedgerError::validation("password is required"));
        }
        if self
            .credentials
            .verify_login_password(account.owner_id, password)
            .await?
        {
            Ok(())
        } else {
            Err(LedgerError::Forbidden("login password does not match".to_string()))
        }
    }

    async fn hash(&self, pin: &str) -> LedgerResult<String> {
        let hasher = self.hasher.clone();
        let pin = pin.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&pin))
            .await
            .map_err(|e| LedgerError::Internal(e.to_string()))?
            .map_err(|e| LedgerError::Internal(e.to_string()))
    }

    async fn check(&self, pin: &str, hash: String) -> LedgerResult<bool> {
        let hasher = self.hasher.clone();
        let pin = pin.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&pin, &hash))
            .await
            .map_err(|e| LedgerError::Internal(e.to_string()))?
            .map_err(|e| LedgerError::Internal(e.to_string()))
    }
}

fn validate_new_pin(pin: &str, confirm: &str) -> LedgerResult<()> {
    validate_simple_password(pin)?;
    if pin != confirm {
        return Err(LedgerError::validation(
            "simple password confirmation does not match",
        ));
    }
    Ok(())
}
