//! `SeaORM` Entity for notifications table.

use pocketbank_core::LedgerError;
use pocketbank_core::notification::Notification;
use pocketbank_shared::types::{AccountId, Amount, NotificationId, TransactionId};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::parse_column;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub content: String,
    pub amount: Option<i64>,
    pub related_transaction_id: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain notification.
    pub fn into_domain(self) -> Result<Notification, LedgerError> {
        Ok(Notification {
            id: NotificationId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            notification_type: parse_column(&self.notification_type, "notification type")?,
            title: self.title,
            content: self.content,
            amount: self.amount.map(Amount::new),
            related_transaction_id: self.related_transaction_id.map(TransactionId::from_uuid),
            is_read: self.is_read,
            read_at: self.read_at,
            created_at: self.created_at,
        })
    }
}

impl From<&Notification> for ActiveModel {
    fn from(n: &Notification) -> Self {
        Self {
            id: Set(n.id.into_inner()),
            account_id: Set(n.account_id.into_inner()),
            notification_type: Set(n.notification_type.as_str().to_string()),
            title: Set(n.title.clone()),
            content: Set(n.content.clone()),
            amount: Set(n.amount.map(Amount::value)),
            related_transaction_id: Set(n.related_transaction_id.map(TransactionId::into_inner)),
            is_read: Set(n.is_read),
            read_at: Set(n.read_at),
            created_at: Set(n.created_at),
        }
    }
}
