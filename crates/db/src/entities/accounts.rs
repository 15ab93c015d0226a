//! `SeaORM` Entity for accounts table.

use pocketbank_core::LedgerError;
use pocketbank_core::ledger::Account;
use pocketbank_shared::types::{AccountId, Amount, UserId};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::{account_number, parse_column};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub owner_id: Uuid,
    pub owner_name: String,
    #[sea_orm(unique)]
    pub account_number: String,
    pub balance: i64,
    pub status: String,
    pub simple_password_hash: Option<String>,
    pub failed_password_attempts: i32,
    pub credential_version: i64,
    pub version: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
    #[sea_orm(has_many = "super::scheduled_transfers::Entity")]
    ScheduledTransfers,
    #[sea_orm(has_many = "super::notifications::Entity")]
    Notifications,
    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::scheduled_transfers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ScheduledTransfers.def()
    }
}

impl Related<super::notifications::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Converts the row into the domain account.
    pub fn into_domain(self) -> Result<Account, LedgerError> {
        Ok(Account {
            id: AccountId::from_uuid(self.id),
            owner_id: UserId::from_uuid(self.owner_id),
            owner_name: self.owner_name,
            account_number: account_number(&self.account_number)?,
            balance: Amount::new(self.balance),
            status: parse_column(&self.status, "account status")?,
            simple_password_hash: self.simple_password_hash,
            failed_password_attempts: u32::try_from(self.failed_password_attempts).unwrap_or(0),
            credential_version: self.credential_version,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<&Account> for ActiveModel {
    fn from(account: &Account) -> Self {
        Self {
            id: Set(account.id.into_inner()),
            owner_id: Set(account.owner_id.into_inner()),
            owner_name: Set(account.owner_name.clone()),
            account_number: Set(account.account_number.digits().to_string()),
            balance: Set(account.balance.value()),
            status: Set(account.status.as_str().to_string()),
            simple_password_hash: Set(account.simple_password_hash.clone()),
            failed_password_attempts: Set(i32::try_from(account.failed_password_attempts).unwrap_or(i32::MAX)),
            credential_version: Set(account.credential_version),
            version: Set(account.version),
            created_at: Set(account.created_at),
            updated_at: Set(account.updated_at),
        }
    }
}
