//! Port traits for external collaborators.

use async_trait::async_trait;
use pocketbank_shared::types::UserId;

use crate::ledger::LedgerResult;
use crate::notification::Notification;

/// Checks login passwords against the auth service.
///
/// Used where the mobile client asks for the login password instead of the
/// simple password: registering a PIN and unlocking an account.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Returns `Ok(false)` for a wrong password and `Err` only when the
    /// collaborator could not answer.
    async fn verify_login_password(&self, user: UserId, password: &str) -> LedgerResult<bool>;
}

/// Delivers stored notifications to devices.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Best-effort delivery; failures are logged by the caller and dropped.
    async fn deliver(&self, notification: &Notification) -> LedgerResult<()>;
}
