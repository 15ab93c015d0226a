//! Ledger domain types: accounts and append-only transactions.

use chrono::{DateTime, Utc};
use pocketbank_shared::types::{
    AccountId, AccountNumber, Amount, QrPaymentId, ScheduleId, TransactionId, UserId,
};
use serde::{Deserialize, Serialize};

/// Generates `as_str` and `FromStr` for a status-like enum stored as text.
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Returns the stored/serialized form.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::ledger::LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::ledger::LedgerError::validation(format!(
                        concat!("unknown ", stringify!($name), ": {}"),
                        other
                    ))),
                }
            }
        }
    };
}

pub(crate) use text_enum;

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    /// Account can send and receive money.
    Active,
    /// Account is frozen by the owner or by repeated PIN mismatches.
    Locked,
}

text_enum!(AccountStatus {
    Active => "ACTIVE",
    Locked => "LOCKED",
});

/// A customer bank account.
///
/// `balance` is never negative and is only changed by the ledger store while
/// the account lock is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Owning user (from the auth service).
    pub owner_id: UserId,
    /// Owner display name.
    pub owner_name: String,
    /// Twelve-digit account number.
    pub account_number: AccountNumber,
    /// Current balance in won.
    pub balance: Amount,
    /// Current status.
    pub status: AccountStatus,
    /// Argon2 PHC string of the simple password, if registered.
    #[serde(skip)]
    pub simple_password_hash: Option<String>,
    /// Consecutive simple-password mismatches.
    pub failed_password_attempts: u32,
    /// Bumped whenever the simple password is registered or changed.
    pub credential_version: i64,
    /// Optimistic concurrency counter, bumped on every write.
    pub version: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Opens a new, empty, ACTIVE account.
    #[must_use]
    pub fn open(
        owner_id: UserId,
        owner_name: &str,
        account_number: AccountNumber,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            owner_id,
            owner_name: owner_name.to_string(),
            account_number,
            balance: Amount::ZERO,
            status: AccountStatus::Active,
            simple_password_hash: None,
            failed_password_attempts: 0,
            credential_version: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the account is ACTIVE.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    /// Returns true if a simple password is registered.
    #[must_use]
    pub const fn has_simple_password(&self) -> bool {
        self.simple_password_hash.is_some()
    }
}

/// Transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Account-to-account transfer.
    Transfer,
    /// Payment of a QR intent.
    QrPayment,
    /// Execution of a scheduled transfer.
    ScheduledTransfer,
    /// External credit (opening balance, seeding).
    Deposit,
    /// Owner tops up their own account.
    SelfDeposit,
}

text_enum!(TransactionType {
    Transfer => "TRANSFER",
    QrPayment => "QR_PAYMENT",
    ScheduledTransfer => "SCHEDULED_TRANSFER",
    Deposit => "DEPOSIT",
    SelfDeposit => "SELF_DEPOSIT",
});

impl TransactionType {
    /// All types, in display order.
    pub const ALL: [Self; 5] = [
        Self::Transfer,
        Self::QrPayment,
        Self::ScheduledTransfer,
        Self::Deposit,
        Self::SelfDeposit,
    ];

    /// Returns true for single-account credits.
    #[must_use]
    pub const fn is_deposit(&self) -> bool {
        matches!(self, Self::Deposit | Self::SelfDeposit)
    }
}

/// Transaction status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Balances were changed.
    Completed,
    /// Attempt was rejected after locking; balances unchanged.
    Failed,
}

text_enum!(TransactionStatus {
    Completed => "COMPLETED",
    Failed => "FAILED",
});

/// An append-only ledger record.
///
/// For deposits `to_*` is empty and `from_*` is the credited account. Party
/// names are snapshotted at posting time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Transaction type.
    pub tx_type: TransactionType,
    /// Outcome.
    pub status: TransactionStatus,
    /// Originating (debited, or for deposits credited) account.
    pub from_account_id: AccountId,
    /// Originating account number.
    pub from_account_number: AccountNumber,
    /// Originating account owner name.
    pub from_owner_name: String,
    /// Credited account for two-party transactions.
    pub to_account_id: Option<AccountId>,
    /// Credited account number.
    pub to_account_number: Option<AccountNumber>,
    /// Credited account owner name.
    pub to_owner_name: Option<String>,
    /// Amount moved (or attempted).
    pub amount: Amount,
    /// Free-text description.
    pub description: String,
    /// Originating account balance after posting.
    pub balance_after: Amount,
    /// Machine code for FAILED rows.
    pub failure_reason: Option<String>,
    /// Scheduled transfer that produced this row.
    pub schedule_id: Option<ScheduleId>,
    /// QR intent settled by this row.
    pub qr_payment_id: Option<QrPaymentId>,
    /// Posting time.
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns true if `account` took part in this transaction.
    #[must_use]
    pub fn involves(&self, account: AccountId) -> bool {
        self.from_account_id == account || self.to_account_id == Some(account)
    }

    /// Returns true if `account` should see this row in its history.
    ///
    /// FAILED rows are private to the originator.
    #[must_use]
    pub fn visible_to(&self, account: AccountId) -> bool {
        self.from_account_id == account
            || (self.to_account_id == Some(account) && self.status == TransactionStatus::Completed)
    }

    /// Returns true if this row credited `account`.
    #[must_use]
    pub fn is_credit_for(&self, account: AccountId) -> bool {
        if self.tx_type.is_deposit() {
            self.from_account_id == account
        } else {
            self.to_account_id == Some(account)
        }
    }

    /// Returns the counterparty name as seen by `account`.
    #[must_use]
    pub fn counterparty_name(&self, account: AccountId) -> Option<&str> {
        if self.tx_type.is_deposit() {
            None
        } else if self.from_account_id == account {
            self.to_owner_name.as_deref()
        } else {
            Some(&self.from_owner_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn number(s: &str) -> AccountNumber {
        AccountNumber::parse(s).unwrap()
    }

    fn sample(tx_type: TransactionType, status: TransactionStatus) -> (Transaction, AccountId, AccountId) {
        let from = AccountId::new();
        let to = AccountId::new();
        let tx = Transaction {
            id: TransactionId::new(),
            tx_type,
            status,
            from_account_id: from,
            from_account_number: number("111122223333"),
            from_owner_name: "Kim".into(),
            to_account_id: Some(to),
            to_account_number: Some(number("444455556666")),
            to_owner_name: Some("Lee".into()),
            amount: Amount::new(3000),
            description: String::new(),
            balance_after: Amount::new(7000),
            failure_reason: None,
            schedule_id: None,
            qr_payment_id: None,
            created_at: Utc::now(),
        };
        (tx, from, to)
    }

    #[test]
    fn test_text_enums_roundtrip() {
        for t in TransactionType::ALL {
            assert_eq!(TransactionType::from_str(t.as_str()).unwrap(), t);
        }
        assert_eq!(AccountStatus::from_str("LOCKED").unwrap(), AccountStatus::Locked);
        assert!(TransactionStatus::from_str("PENDING").is_err());
    }

    #[test]
    fn test_serde_matches_text_form() {
        assert_eq!(
            serde_json::to_string(&TransactionType::QrPayment).unwrap(),
            "\"QR_PAYMENT\""
        );
    }

    #[test]
    fn test_failed_rows_are_private_to_originator() {
        let (tx, from, to) = sample(TransactionType::Transfer, TransactionStatus::Failed);
        assert!(tx.visible_to(from));
        assert!(!tx.visible_to(to));
        assert!(tx.involves(to));
    }

    #[test]
    fn test_counterparty_name() {
        let (tx, from, to) = sample(TransactionType::Transfer, TransactionStatus::Completed);
        assert_eq!(tx.counterparty_name(from), Some("Lee"));
        assert_eq!(tx.counterparty_name(to), Some("Kim"));
        assert!(tx.is_credit_for(to));
        assert!(!tx.is_credit_for(from));
    }

    #[test]
    fn test_simple_password_hash_is_never_serialized() {
        let mut account = Account::open(UserId::new(), "Kim", number("111122223333"), Utc::now());
        account.simple_password_hash = Some("$argon2id$secret".into());
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("argon2"));
    }
}
