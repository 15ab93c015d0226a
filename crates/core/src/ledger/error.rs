//! Ledger error types for validation, state and concurrency errors.
//!
//! Every failure of the money-movement core is one of these variants. The
//! machine code returned by [`LedgerError::error_code`] is what clients see in
//! the `error` field and what is stored as `failureReason` on FAILED
//! transactions and schedules.

use pocketbank_shared::types::Amount;
use thiserror::Error;

/// Result type alias for core operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Request failed validation before any lock was taken.
    #[error("{0}")]
    Validation(String),

    // ========== Account Errors ==========
    /// Account could not be resolved.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Account is LOCKED and cannot move money.
    #[error("Account is locked")]
    AccountLocked,

    /// Balance is lower than the requested amount at the instant of locking.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance observed under lock.
        balance: Amount,
        /// Amount that was requested.
        requested: Amount,
    },

    // ========== Simple Password Errors ==========
    /// Simple password did not match.
    #[error("Simple password does not match ({remaining_attempts} attempts remaining)")]
    SimplePasswordMismatch {
        /// Attempts left before the account locks.
        remaining_attempts: u32,
    },

    /// No simple password has been registered for the account.
    #[error("Simple password is not registered")]
    SimplePasswordNotSet,

    /// Credentials changed between scheduling and execution.
    #[error("Account credentials changed since the transfer was scheduled")]
    CredentialChanged,

    // ========== QR Errors ==========
    /// QR intent is past its expiry.
    #[error("QR code has expired")]
    QrExpired,

    /// QR intent was already paid.
    #[error("QR code has already been used")]
    QrAlreadyUsed,

    /// QR code does not resolve to an intent.
    #[error("QR code not found")]
    QrNotFound,

    // ========== Schedule Errors ==========
    /// Scheduled transfer not found.
    #[error("Scheduled transfer not found")]
    ScheduleNotFound,

    /// Scheduled transfer already left the PENDING state.
    #[error("Scheduled transfer is no longer pending")]
    ScheduleNotPending,

    // ========== Generic Errors ==========
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate or conflicting state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Caller may not act on the resource.
    #[error("Access denied: {0}")]
    Forbidden(String),

    // ========== Concurrency Errors ==========
    /// Lock acquisition timed out.
    #[error("Account is busy, please retry")]
    Busy,

    /// Concurrent modification detected.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    // ========== Infrastructure Errors ==========
    /// Collaborator (auth service) failed.
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountLocked => "ACCOUNT_LOCKED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::SimplePasswordMismatch { .. } => "SIMPLE_PASSWORD_MISMATCH",
            Self::SimplePasswordNotSet => "SIMPLE_PASSWORD_NOT_SET",
            Self::CredentialChanged => "CREDENTIAL_CHANGED",
            Self::QrExpired => "QR_EXPIRED",
            Self::QrAlreadyUsed => "QR_ALREADY_USED",
            Self::QrNotFound => "QR_NOT_FOUND",
            Self::ScheduleNotFound => "SCHEDULE_NOT_FOUND",
            Self::ScheduleNotPending => "SCHEDULE_NOT_PENDING",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::Busy => "BUSY",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    ///
    /// PIN and lock failures are 403, not 401: the client treats 401 as an
    /// expired session and logs the user out.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - validation errors
            Self::Validation(_) | Self::SimplePasswordNotSet => 400,

            // 403 Forbidden - credential and permission errors
            Self::AccountLocked
            | Self::SimplePasswordMismatch { .. }
            | Self::CredentialChanged
            | Self::Forbidden(_) => 403,

            // 404 Not Found
            Self::AccountNotFound(_)
            | Self::QrNotFound
            | Self::ScheduleNotFound
            | Self::NotFound(_) => 404,

            // 409 Conflict - state and concurrency errors
            Self::QrAlreadyUsed
            | Self::ScheduleNotPending
            | Self::Conflict(_)
            | Self::Busy
            | Self::ConcurrentModification => 409,

            // 422 Unprocessable - well-formed but cannot be honored
            Self::InsufficientFunds { .. } | Self::QrExpired => 422,

            // 502 Bad Gateway
            Self::ExternalService(_) => 502,

            // 500 Internal Server Error
            Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::ConcurrentModification)
    }

    /// Returns true if this failure happened after the account locks were
    /// held and must therefore leave a FAILED transaction behind.
    #[must_use]
    pub const fn is_recorded_failure(&self) -> bool {
        matches!(self, Self::InsufficientFunds { .. } | Self::AccountLocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            LedgerError::validation("bad").error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            LedgerError::InsufficientFunds {
                balance: Amount::new(50),
                requested: Amount::new(100),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(LedgerError::QrAlreadyUsed.error_code(), "QR_ALREADY_USED");
        assert_eq!(LedgerError::Busy.error_code(), "BUSY");
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(LedgerError::validation("x").http_status_code(), 400);
        assert_eq!(
            LedgerError::SimplePasswordMismatch {
                remaining_attempts: 2
            }
            .http_status_code(),
            403
        );
        assert_eq!(LedgerError::AccountLocked.http_status_code(), 403);
        assert_eq!(
            LedgerError::AccountNotFound("x".into()).http_status_code(),
            404
        );
        assert_eq!(LedgerError::Busy.http_status_code(), 409);
        assert_eq!(LedgerError::QrAlreadyUsed.http_status_code(), 409);
        assert_eq!(LedgerError::QrExpired.http_status_code(), 422);
        assert_eq!(
            LedgerError::Storage("test".to_string()).http_status_code(),
            500
        );
    }

    #[test]
    fn test_retryable_errors() {
        assert!(LedgerError::Busy.is_retryable());
        assert!(LedgerError::ConcurrentModification.is_retryable());
        assert!(!LedgerError::AccountLocked.is_retryable());
        assert!(!LedgerError::QrExpired.is_retryable());
    }

    #[test]
    fn test_recorded_failures() {
        assert!(LedgerError::AccountLocked.is_recorded_failure());
        assert!(
            LedgerError::InsufficientFunds {
                balance: Amount::ZERO,
                requested: Amount::new(100),
            }
            .is_recorded_failure()
        );
        assert!(!LedgerError::validation("amount").is_recorded_failure());
        assert!(!LedgerError::Busy.is_recorded_failure());
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            balance: Amount::new(50),
            requested: Amount::new(100),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: balance 50, requested 100"
        );
    }
}
