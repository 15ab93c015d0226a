//! Notification types.

use chrono::{DateTime, Utc};
use pocketbank_shared::types::{AccountId, Amount, NotificationId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::ledger::types::text_enum;

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// Outgoing transfer completed.
    TransferSent,
    /// Incoming transfer completed.
    TransferReceived,
    /// Outgoing transfer rejected after locking.
    TransferFailed,
    /// A transfer or payment to this account was rejected after locking.
    IncomingTransferFailed,
    /// QR payment made.
    QrPaymentSent,
    /// QR payment received.
    QrPaymentReceived,
    /// QR payment rejected after locking.
    QrPaymentFailed,
    /// Self-deposit completed.
    DepositCompleted,
    /// Self-deposit rejected after locking.
    DepositFailed,
    /// Scheduled transfer posted.
    ScheduledTransferExecuted,
    /// Scheduled transfer failed.
    ScheduledTransferFailed,
}

text_enum!(NotificationType {
    TransferSent => "TRANSFER_SENT",
    TransferReceived => "TRANSFER_RECEIVED",
    TransferFailed => "TRANSFER_FAILED",
    IncomingTransferFailed => "INCOMING_TRANSFER_FAILED",
    QrPaymentSent => "QR_PAYMENT_SENT",
    QrPaymentReceived => "QR_PAYMENT_RECEIVED",
    QrPaymentFailed => "QR_PAYMENT_FAILED",
    DepositCompleted => "DEPOSIT_COMPLETED",
    DepositFailed => "DEPOSIT_FAILED",
    ScheduledTransferExecuted => "SCHEDULED_TRANSFER_EXECUTED",
    ScheduledTransferFailed => "SCHEDULED_TRANSFER_FAILED",
});

impl NotificationType {
    /// Short title shown in the notification list.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::TransferSent => "Transfer sent",
            Self::TransferReceived => "Money received",
            Self::TransferFailed => "Transfer failed",
            Self::IncomingTransferFailed => "Incoming transfer failed",
            Self::QrPaymentSent => "QR payment complete",
            Self::QrPaymentReceived => "QR payment received",
            Self::QrPaymentFailed => "QR payment failed",
            Self::DepositCompleted => "Deposit complete",
            Self::DepositFailed => "Deposit failed",
            Self::ScheduledTransferExecuted => "Scheduled transfer sent",
            Self::ScheduledTransferFailed => "Scheduled transfer failed",
        }
    }
}

/// A stored notification. `is_read` is authoritative server state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification ID.
    pub id: NotificationId,
    /// Recipient account.
    pub account_id: AccountId,
    /// Kind of event.
    pub notification_type: NotificationType,
    /// Title line.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Amount involved, if any.
    pub amount: Option<Amount>,
    /// Related ledger row, if any.
    pub related_transaction_id: Option<TransactionId>,
    /// Whether the owner has read it.
    pub is_read: bool,
    /// When it was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_text_round_trips() {
        for kind in [
            NotificationType::TransferFailed,
            NotificationType::IncomingTransferFailed,
            NotificationType::DepositFailed,
            NotificationType::ScheduledTransferFailed,
        ] {
            assert_eq!(kind.as_str().parse::<NotificationType>().unwrap(), kind);
        }
        assert_eq!(
            "INCOMING_TRANSFER_FAILED".parse::<NotificationType>().unwrap().title(),
            "Incoming transfer failed"
        );
    }

    #[test]
    fn test_unknown_type_is_a_validation_error() {
        let err = "PIGEON".parse::<NotificationType>().unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
    }
}
