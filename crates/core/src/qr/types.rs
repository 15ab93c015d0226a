//! QR payment intent types.

use chrono::{DateTime, Duration, Utc};
use pocketbank_shared::types::{AccountId, AccountNumber, Amount, QrPaymentId, TransactionId};
use serde::{Deserialize, Serialize};

use crate::ledger::types::text_enum;
use crate::ledger::LedgerError;

/// How long a generated QR code stays payable.
pub const QR_VALIDITY: Duration = Duration::minutes(10);

/// QR intent status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QrStatus {
    /// Waiting for a buyer.
    Pending,
    /// Paid exactly once.
    Paid,
    /// Expiry observed before payment.
    Expired,
}

text_enum!(QrStatus {
    Pending => "PENDING",
    Paid => "PAID",
    Expired => "EXPIRED",
});

/// A seller's single-use request for payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrPaymentIntent {
    /// Intent ID.
    pub id: QrPaymentId,
    /// Opaque token encoded in the QR image.
    pub code: String,
    /// Account that receives the payment.
    pub seller_account_id: AccountId,
    /// Seller account number.
    pub seller_account_number: AccountNumber,
    /// Seller display name.
    pub seller_name: String,
    /// Amount the buyer pays.
    pub amount: Amount,
    /// Free-text description.
    pub description: String,
    /// Current status.
    pub status: QrStatus,
    /// Payable until (exclusive).
    pub expires_at: DateTime<Utc>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Settlement time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Paying account.
    pub buyer_account_id: Option<AccountId>,
    /// Settling transaction.
    pub transaction_id: Option<TransactionId>,
}

impl QrPaymentIntent {
    /// Returns true if the intent can no longer be paid at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Checks that the intent is payable at `now`.
    ///
    /// A PAID intent reports `QrAlreadyUsed` even after its expiry, so a
    /// replayed scan never looks like a timing problem.
    pub fn ensure_payable(&self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        match self.status {
            QrStatus::Paid => Err(LedgerError::QrAlreadyUsed),
            QrStatus::Expired => Err(LedgerError::QrExpired),
            QrStatus::Pending if self.is_expired_at(now) => Err(LedgerError::QrExpired),
            QrStatus::Pending => Ok(()),
        }
    }
}
