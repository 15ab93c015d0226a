//! `SeaORM` entity definitions.
//!
//! Statuses and types are stored as their text codes; amounts as integer won.

pub mod accounts;
pub mod favorites;
pub mod idempotency_records;
pub mod notifications;
pub mod qr_payments;
pub mod scheduled_transfers;
pub mod transactions;

use std::fmt::Display;
use std::str::FromStr;

use pocketbank_core::LedgerError;
use pocketbank_shared::types::AccountNumber;

/// Parses a text column into its domain type.
pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, LedgerError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| LedgerError::Storage(format!("invalid {column} {value:?}: {e}")))
}

/// Parses a stored account number.
pub(crate) fn account_number(value: &str) -> Result<AccountNumber, LedgerError> {
    AccountNumber::parse(value)
        .map_err(|e| LedgerError::Storage(format!("invalid account number {value:?}: {e}")))
}
