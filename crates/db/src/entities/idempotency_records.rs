//! `SeaORM` Entity for idempotency_records table.

use pocketbank_core::guard::IdempotencyRecord;
use sea_orm::entity::prelude::*;
use sea_orm::Set;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "idempotency_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub scope: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    pub response: Json,
    pub created_at: DateTimeUtc,
    pub expires_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for IdempotencyRecord {
    fn from(m: Model) -> Self {
        Self {
            scope: m.scope,
            key: m.key,
            response: m.response,
            created_at: m.created_at,
            expires_at: m.expires_at,
        }
    }
}

impl From<&IdempotencyRecord> for ActiveModel {
    fn from(r: &IdempotencyRecord) -> Self {
        Self {
            scope: Set(r.scope.clone()),
            key: Set(r.key.clone()),
            response: Set(r.response.clone()),
            created_at: Set(r.created_at),
            expires_at: Set(r.expires_at),
        }
    }
}
