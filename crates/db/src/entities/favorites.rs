//! `SeaORM` Entity for favorites table.

use pocketbank_core::LedgerError;
use pocketbank_core::favorite::Favorite;
use pocketbank_shared::types::{AccountId, FavoriteId};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::account_number;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub account_number: String,
    pub nickname: String,
    pub memo: Option<String>,
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
    /// Converts the row into the domain favorite.
    pub fn into_domain(self) -> Result<Favorite, LedgerError> {
        Ok(Favorite {
            id: FavoriteId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            account_number: account_number(&self.account_number)?,
            nickname: self.nickname,
            memo: self.memo,
            created_at: self.created_at,
        })
    }
}

impl From<&Favorite> for ActiveModel {
    fn from(f: &Favorite) -> Self {
        Self {
            id: Set(f.id.into_inner()),
            account_id: Set(f.account_id.into_inner()),
            account_number: Set(f.account_number.digits().to_string()),
            nickname: Set(f.nickname.clone()),
            memo: Set(f.memo.clone()),
            created_at: Set(f.created_at),
        }
    }
}
