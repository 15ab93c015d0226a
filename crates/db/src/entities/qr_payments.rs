//! `SeaORM` Entity for qr_payments table.

use pocketbank_core::LedgerError;
use pocketbank_core::qr::QrPaymentIntent;
use pocketbank_shared::types::{AccountId, Amount, QrPaymentId, TransactionId};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::{account_number, parse_column};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "qr_payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub seller_account_id: Uuid,
    pub seller_account_number: String,
    pub seller_name: String,
    pub amount: i64,
    pub description: String,
    pub status: String,
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub paid_at: Option<DateTimeUtc>,
    pub buyer_account_id: Option<Uuid>,
    pub transaction_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::SellerAccountId",
        to = "super::accounts::Column::Id"
    )]
    Seller,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain intent.
    pub fn into_domain(self) -> Result<QrPaymentIntent, LedgerError> {
        Ok(QrPaymentIntent {
            id: QrPaymentId::from_uuid(self.id),
            code: self.code,
            seller_account_id: AccountId::from_uuid(self.seller_account_id),
            seller_account_number: account_number(&self.seller_account_number)?,
            seller_name: self.seller_name,
            amount: Amount::new(self.amount),
            description: self.description,
            status: parse_column(&self.status, "QR status")?,
            expires_at: self.expires_at,
            created_at: self.created_at,
            paid_at: self.paid_at,
            buyer_account_id: self.buyer_account_id.map(AccountId::from_uuid),
            transaction_id: self.transaction_id.map(TransactionId::from_uuid),
        })
    }
}

impl From<&QrPaymentIntent> for ActiveModel {
    fn from(intent: &QrPaymentIntent) -> Self {
        Self {
            id: Set(intent.id.into_inner()),
            code: Set(intent.code.clone()),
            seller_account_id: Set(intent.seller_account_id.into_inner()),
            seller_account_number: Set(intent.seller_account_number.digits().to_string()),
            seller_name: Set(intent.seller_name.clone()),
            amount: Set(intent.amount.value()),
            description: Set(intent.description.clone()),
            status: Set(intent.status.as_str().to_string()),
            expires_at: Set(intent.expires_at),
            created_at: Set(intent.created_at),
            paid_at: Set(intent.paid_at),
            buyer_account_id: Set(intent.buyer_account_id.map(AccountId::into_inner)),
            transaction_id: Set(intent.transaction_id.map(TransactionId::into_inner)),
        }
    }
}
