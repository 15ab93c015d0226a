//! Scheduled transfer types and state machine.

use chrono::{DateTime, Utc};
use pocketbank_shared::types::{AccountId, AccountNumber, Amount, ScheduleId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::ledger::types::text_enum;

/// Scheduled transfer status.
///
/// ```text
/// PENDING -> EXECUTING -> EXECUTED | FAILED
/// PENDING -> CANCELLED
/// ```
///
/// EXECUTING is the worker's claim; every transition is a compare-and-set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScheduleStatus {
    /// Waiting for its due time.
    Pending,
    /// Claimed by a worker.
    Executing,
    /// Transfer posted.
    Executed,
    /// Execution failed; see `failure_reason`.
    Failed,
    /// Cancelled by the owner.
    Cancelled,
}

text_enum!(ScheduleStatus {
    Pending => "PENDING",
    Executing => "EXECUTING",
    Executed => "EXECUTED",
    Failed => "FAILED",
    Cancelled => "CANCELLED",
});

impl ScheduleStatus {
    /// Returns true for states that never change again.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Failed | Self::Cancelled)
    }
}

/// A future-dated transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTransfer {
    /// Schedule ID.
    pub id: ScheduleId,
    /// Owning (debited) account.
    pub account_id: AccountId,
    /// Owning account number.
    pub from_account_number: AccountNumber,
    /// Destination, resolved at execution time.
    pub to_account_number: AccountNumber,
    /// Amount to send.
    pub amount: Amount,
    /// Free-text description.
    pub description: String,
    /// Due time.
    pub scheduled_at: DateTime<Utc>,
    /// Current status.
    pub status: ScheduleStatus,
    /// When the transfer was posted.
    pub executed_at: Option<DateTime<Utc>>,
    /// Machine code of the failure.
    pub failure_reason: Option<String>,
    /// Posting (or FAILED row) produced by execution.
    pub transaction_id: Option<TransactionId>,
    /// When the current claim was taken.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Owner's credential version when the schedule was created.
    pub credential_version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// How a claimed schedule ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Posted; the schedule is EXECUTED.
    Executed(crate::ledger::Transaction),
    /// The schedule is FAILED with this reason.
    Failed(crate::ledger::LedgerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_stored_text() {
        assert_eq!("EXECUTING".parse::<ScheduleStatus>().unwrap(), ScheduleStatus::Executing);
        assert_eq!(ScheduleStatus::Cancelled.to_string(), "CANCELLED");
        assert!("DONE".parse::<ScheduleStatus>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ScheduleStatus::Pending.is_terminal());
        assert!(!ScheduleStatus::Executing.is_terminal());
        assert!(ScheduleStatus::Failed.is_terminal());
    }
}
