//! Transfer engine requests and results.
//!
//! Results are serialized as-is into responses and idempotency records, so
//! their field names follow the client contract.

use chrono::{DateTime, Utc};
use pocketbank_shared::types::{AccountNumber, Amount, QrPaymentId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::auth::SimplePassword;
use crate::ledger::TransactionStatus;
use crate::qr::QrStatus;

/// Send money to another account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Destination account number.
    pub to_account_number: AccountNumber,
    /// Amount in won (at least 100).
    pub amount: Amount,
    /// Caller's simple password.
    pub simple_password: SimplePassword,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Outcome of a completed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResult {
    /// Posting.
    pub transaction_id: TransactionId,
    /// Sender account number.
    pub from_account: AccountNumber,
    /// Recipient account number.
    pub to_account: AccountNumber,
    /// Recipient owner name.
    pub to_account_owner: String,
    /// Amount sent.
    pub amount: Amount,
    /// Description.
    pub description: String,
    /// Always COMPLETED.
    pub status: TransactionStatus,
    /// Posting time.
    pub created_at: DateTime<Utc>,
    /// Sender balance after the transfer.
    pub balance_after: Amount,
}

/// Top up the caller's own account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfDepositRequest {
    /// Amount in won (at least 1,000).
    pub amount: Amount,
    /// Caller's simple password.
    pub simple_password: SimplePassword,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Outcome of a self-deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResult {
    /// Posting.
    pub transaction_id: TransactionId,
    /// Credited account number.
    pub account_number: AccountNumber,
    /// Amount deposited.
    pub amount: Amount,
    /// Balance after the deposit.
    pub balance_after: Amount,
    /// Description.
    pub description: String,
    /// Posting time.
    pub deposited_at: DateTime<Utc>,
}

/// Create a QR payment intent.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrGenerateRequest {
    /// Amount the buyer pays (at least 100).
    pub amount: Amount,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A generated QR intent, as shown to the seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResult {
    /// Intent ID.
    pub qr_payment_id: QrPaymentId,
    /// Token to encode in the QR image.
    pub qr_code: String,
    /// Amount.
    pub amount: Amount,
    /// Description.
    pub description: String,
    /// Always PENDING when generated.
    pub status: QrStatus,
    /// Payable until.
    pub expires_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Pay a scanned QR code.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayRequest {
    /// Scanned token.
    pub qr_code: String,
    /// Buyer's simple password.
    pub simple_password: SimplePassword,
}

/// Outcome of a QR payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPayResult {
    /// Settled intent.
    pub qr_payment_id: QrPaymentId,
    /// Posting.
    pub transaction_id: TransactionId,
    /// Buyer account number.
    pub buyer_account: AccountNumber,
    /// Seller account number.
    pub seller_account: AccountNumber,
    /// Seller name.
    pub seller_name: String,
    /// Amount paid.
    pub amount: Amount,
    /// Description.
    pub description: String,
    /// Always PAID.
    pub status: QrStatus,
    /// Settlement time.
    pub paid_at: DateTime<Utc>,
    /// Buyer balance after payment.
    pub balance_after: Amount,
}
