//! Request validation rules.
//!
//! Everything here runs before any lock is taken. A request that fails
//! validation leaves no trace in the ledger.

use chrono::{DateTime, Duration, Utc};
use pocketbank_shared::types::Amount;

use super::error::{LedgerError, LedgerResult};

/// Smallest transfer or QR payment, in won.
pub const MIN_TRANSFER_AMOUNT: Amount = Amount::new(100);

/// Smallest self-deposit, in won.
pub const MIN_SELF_DEPOSIT_AMOUNT: Amount = Amount::new(1_000);

/// Largest scheduled transfer, in won.
pub const MAX_SCHEDULED_AMOUNT: Amount = Amount::new(1_000_000);

/// Longest description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Simple passwords are exactly this many ASCII digits.
pub const SIMPLE_PASSWORD_LEN: usize = 6;

/// Earliest a transfer may be scheduled, relative to now.
pub const MIN_SCHEDULE_LEAD: Duration = Duration::minutes(1);

/// Latest a transfer may be scheduled, relative to now.
pub const MAX_SCHEDULE_HORIZON: Duration = Duration::days(365);

/// Longest idempotency key accepted.
pub const MAX_IDEMPOTENCY_KEY_LEN: usize = 128;

/// Checks `min <= amount <= max`.
pub fn validate_amount(amount: Amount, min: Amount, max: Amount) -> LedgerResult<()> {
    if amount < min {
        return Err(LedgerError::validation(format!(
            "amount must be at least {min}"
        )));
    }
    if amount > max {
        return Err(LedgerError::validation(format!(
            "amount must not exceed {max}"
        )));
    }
    Ok(())
}

/// Trims and length-checks an optional description.
pub fn normalize_description(description: Option<&str>) -> LedgerResult<String> {
    let text = description.map(str::trim).unwrap_or_default();
    if text.chars().count() > MAX_DESCRIPTION_CHARS {
        return Err(LedgerError::validation(format!(
            "description must be at most {MAX_DESCRIPTION_CHARS} characters"
        )));
    }
    Ok(text.to_string())
}

/// Checks that a simple password is exactly six ASCII digits.
pub fn validate_simple_password(pin: &str) -> LedgerResult<()> {
    if pin.len() == SIMPLE_PASSWORD_LEN && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(LedgerError::validation(
            "simple password must be exactly 6 digits",
        ))
    }
}

/// Checks that `scheduled_at` lies in `[now + 1 minute, now + 1 year]`.
pub fn validate_schedule_window(scheduled_at: DateTime<Utc>, now: DateTime<Utc>) -> LedgerResult<()> {
    if scheduled_at < now + MIN_SCHEDULE_LEAD {
        return Err(LedgerError::validation(
            "scheduledAt must be at least 1 minute in the future",
        ));
    }
    if scheduled_at > now + MAX_SCHEDULE_HORIZON {
        return Err(LedgerError::validation(
            "scheduledAt must be within 1 year",
        ));
    }
    Ok(())
}

/// Checks an idempotency key: 1..=128 visible ASCII characters.
pub fn validate_idempotency_key(key: &str) -> LedgerResult<()> {
    if key.is_empty()
        || key.len() > MAX_IDEMPOTENCY_KEY_LEN
        || !key.bytes().all(|b| b.is_ascii_graphic())
    {
        return Err(LedgerError::validation(format!(
            "Idempotency-Key must be 1-{MAX_IDEMPOTENCY_KEY_LEN} visible ASCII characters"
        )));
    }
    Ok(())
}
