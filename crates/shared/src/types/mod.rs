//! Common types used across the application.

pub mod account_number;
pub mod id;
pub mod money;
pub mod pagination;

pub use account_number::{AccountNumber, InvalidAccountNumber};
pub use id::*;
pub use money::Amount;
pub use pagination::{PageRequest, PageResponse};
