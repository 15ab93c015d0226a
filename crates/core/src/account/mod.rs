//! Account lifecycle for the authenticated owner.

mod service;

pub(crate) use service::require_account;
pub use service::{AccountOwner, AccountService, LockStatus};
