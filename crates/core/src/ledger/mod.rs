//! The account ledger.
//!
//! This module implements:
//! - Account and transaction types
//! - Error types for every money-movement failure
//! - Request validation rules
//! - Transaction history views

pub mod error;
pub mod history;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use error::{LedgerError, LedgerResult};
pub use history::{TransactionHistory, TransactionView};
pub use types::{Account, AccountStatus, Transaction, TransactionStatus, TransactionType};
