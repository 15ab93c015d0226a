//! Response bodies in the field names the mobile client expects.

use chrono::{DateTime, Utc};
use pocketbank_core::favorite::FavoriteView;
use pocketbank_core::ledger::{Account, AccountStatus};
use pocketbank_core::notification::{Notification, NotificationType};
use pocketbank_core::schedule::{ScheduleStatus, ScheduledTransfer};
use pocketbank_shared::types::{
    AccountId, AccountNumber, Amount, FavoriteId, NotificationId, ScheduleId, TransactionId,
};
use serde::Serialize;

/// The caller's account.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    /// Account id.
    pub account_id: AccountId,
    /// Account number, `NNNN-NNNN-NNNN`.
    pub account_number: AccountNumber,
    /// Owner display name.
    pub owner_name: String,
    /// Balance in won.
    pub balance: Amount,
    /// ACTIVE or LOCKED.
    pub status: AccountStatus,
    /// Opened at.
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            account_number: account.account_number,
            owner_name: account.owner_name,
            balance: account.balance,
            status: account.status,
            created_at: account.created_at,
        }
    }
}

/// One inbox entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Notification id.
    pub notification_id: NotificationId,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Title.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Transaction the event is about.
    pub related_transaction_id: Option<TransactionId>,
    /// Amount involved.
    pub amount: Option<Amount>,
    /// Read flag.
    pub is_read: bool,
    /// When it was read.
    pub read_at: Option<DateTime<Utc>>,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            notification_id: n.id,
            kind: n.notification_type,
            title: n.title,
            content: n.content,
            related_transaction_id: n.related_transaction_id,
            amount: n.amount,
            is_read: n.is_read,
            read_at: n.read_at,
            created_at: n.created_at,
        }
    }
}

/// A scheduled transfer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTransferResponse {
    /// Schedule id.
    pub schedule_id: ScheduleId,
    /// Paying account.
    pub from_account: AccountNumber,
    /// Receiving account.
    pub to_account_number: AccountNumber,
    /// Amount in won.
    pub amount: Amount,
    /// Memo.
    pub description: String,
    /// Due time.
    pub scheduled_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: ScheduleStatus,
    /// When it ran.
    pub executed_at: Option<DateTime<Utc>>,
    /// Why it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Posting made on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<TransactionId>,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<ScheduledTransfer> for ScheduledTransferResponse {
    fn from(s: ScheduledTransfer) -> Self {
        Self {
            schedule_id: s.id,
            from_account: s.from_account_number,
            to_account_number: s.to_account_number,
            amount: s.amount,
            description: s.description,
            scheduled_at: s.scheduled_at,
            status: s.status,
            executed_at: s.executed_at,
            failure_reason: s.failure_reason,
            transaction_id: s.transaction_id,
            created_at: s.created_at,
        }
    }
}

/// A saved recipient.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteResponse {
    /// Favorite id.
    pub favorite_id: FavoriteId,
    /// Saved account number.
    pub account_number: AccountNumber,
    /// Current owner name of that account.
    pub account_owner_name: Option<String>,
    /// Nickname.
    pub nickname: String,
    /// Memo.
    pub memo: Option<String>,
    /// Created at.
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteView> for FavoriteResponse {
    fn from(view: FavoriteView) -> Self {
        let FavoriteView {
            favorite,
            account_owner_name,
        } = view;
        Self {
            favorite_id: favorite.id,
            account_number: favorite.account_number,
            account_owner_name,
            nickname: favorite.nickname,
            memo: favorite.memo,
            created_at: favorite.created_at,
        }
    }
}

/// Simple-password registration state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplePasswordResponse {
    /// True once a PIN is registered.
    pub has_simple_password: bool,
    /// Human-readable summary.
    pub message: &'static str,
}

/// `{count}`.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    /// The count.
    pub count: u64,
}

/// `{valid}`.
#[derive(Debug, Serialize)]
pub struct ValidResponse {
    /// Always true; a mismatch is reported as an error.
    pub valid: bool,
}
