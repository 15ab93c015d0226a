//! `SeaORM` Entity for transactions table (append-only).

use pocketbank_core::LedgerError;
use pocketbank_core::ledger::Transaction;
use pocketbank_shared::types::{AccountId, Amount, QrPaymentId, ScheduleId, TransactionId};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::{account_number, parse_column};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub tx_type: String,
    pub status: String,
    pub from_account_id: Uuid,
    pub from_account_number: String,
    pub from_owner_name: String,
    pub to_account_id: Option<Uuid>,
    pub to_account_number: Option<String>,
    pub to_owner_name: Option<String>,
    pub amount: i64,
    pub description: String,
    pub balance_after: i64,
    pub failure_reason: Option<String>,
    pub schedule_id: Option<Uuid>,
    pub qr_payment_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::FromAccountId",
        to = "super::accounts::Column::Id"
    )]
    FromAccount,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ToAccountId",
        to = "super::accounts::Column::Id"
    )]
    ToAccount,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FromAccount.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain transaction.
    pub fn into_domain(self) -> Result<Transaction, LedgerError> {
        Ok(Transaction {
            id: TransactionId::from_uuid(self.id),
            tx_type: parse_column(&self.tx_type, "transaction type")?,
            status: parse_column(&self.status, "transaction status")?,
            from_account_id: AccountId::from_uuid(self.from_account_id),
            from_account_number: account_number(&self.from_account_number)?,
            from_owner_name: self.from_owner_name,
            to_account_id: self.to_account_id.map(AccountId::from_uuid),
            to_account_number: self
                .to_account_number
                .as_deref()
                .map(account_number)
                .transpose()?,
            to_owner_name: self.to_owner_name,
            amount: Amount::new(self.amount),
            description: self.description,
            balance_after: Amount::new(self.balance_after),
            failure_reason: self.failure_reason,
            schedule_id: self.schedule_id.map(ScheduleId::from_uuid),
            qr_payment_id: self.qr_payment_id.map(QrPaymentId::from_uuid),
            created_at: self.created_at,
        })
    }
}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: Set(tx.id.into_inner()),
            tx_type: Set(tx.tx_type.as_str().to_string()),
            status: Set(tx.status.as_str().to_string()),
            from_account_id: Set(tx.from_account_id.into_inner()),
            from_account_number: Set(tx.from_account_number.digits().to_string()),
            from_owner_name: Set(tx.from_owner_name.clone()),
            to_account_id: Set(tx.to_account_id.map(AccountId::into_inner)),
            to_account_number: Set(tx.to_account_number.as_ref().map(|n| n.digits().to_string())),
            to_owner_name: Set(tx.to_owner_name.clone()),
            amount: Set(tx.amount.value()),
            description: Set(tx.description.clone()),
            balance_after: Set(tx.balance_after.value()),
            failure_reason: Set(tx.failure_reason.clone()),
            schedule_id: Set(tx.schedule_id.map(ScheduleId::into_inner)),
            qr_payment_id: Set(tx.qr_payment_id.map(QrPaymentId::into_inner)),
            created_at: Set(tx.created_at),
        }
    }
}
