//! Core business logic for Pocketbank.
//!
//! This crate contains the money-movement core with ZERO web or database
//! dependencies. Storage is reached through the traits in [`ports`].
//!
//! # Modules
//!
//! - `ledger` - Accounts, transactions, validation and history
//! - `guard` - Per-account locks and idempotency
//! - `transfer` - Transfers, QR payments and self-deposits
//! - `schedule` - Scheduled transfers and their worker
//! - `notification` - Notification dispatch and inbox
//! - `favorite` - Saved recipients
//! - `statistics` - Monthly deposit/withdrawal statistics
//! - `memory` - In-process repositories

pub mod account;
pub mod auth;
pub mod clock;
pub mod favorite;
pub mod guard;
pub mod ledger;
pub mod memory;
pub mod notification;
pub mod ports;
pub mod qr;
pub mod schedule;
pub mod services;
pub mod statistics;
pub mod transfer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use ledger::{LedgerError, LedgerResult};
pub use services::{CoreDeps, CoreServices};
