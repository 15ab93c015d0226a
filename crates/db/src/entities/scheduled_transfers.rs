//! `SeaORM` Entity for scheduled_transfers table.

use pocketbank_core::LedgerError;
use pocketbank_core::schedule::ScheduledTransfer;
use pocketbank_shared::types::{AccountId, Amount, ScheduleId, TransactionId};
use sea_orm::entity::prelude::*;
use sea_orm::Set;

use super::{account_number, parse_column};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "scheduled_transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub from_account_number: String,
    pub to_account_number: String,
    pub amount: i64,
    pub description: String,
    pub scheduled_at: DateTimeUtc,
    pub status: String,
    pub executed_at: Option<DateTimeUtc>,
    pub failure_reason: Option<String>,
    pub transaction_id: Option<Uuid>,
    pub claimed_at: Option<DateTimeUtc>,
    pub credential_version: i64,
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
    /// Converts the row into the domain schedule.
    pub fn into_domain(self) -> Result<ScheduledTransfer, LedgerError> {
        Ok(ScheduledTransfer {
            id: ScheduleId::from_uuid(self.id),
            account_id: AccountId::from_uuid(self.account_id),
            from_account_number: account_number(&self.from_account_number)?,
            to_account_number: account_number(&self.to_account_number)?,
            amount: Amount::new(self.amount),
            description: self.description,
            scheduled_at: self.scheduled_at,
            status: parse_column(&self.status, "schedule status")?,
            executed_at: self.executed_at,
            failure_reason: self.failure_reason,
            transaction_id: self.transaction_id.map(TransactionId::from_uuid),
            claimed_at: self.claimed_at,
            credential_version: self.credential_version,
            created_at: self.created_at,
        })
    }
}

impl From<&ScheduledTransfer> for ActiveModel {
    fn from(schedule: &ScheduledTransfer) -> Self {
        Self {
            id: Set(schedule.id.into_inner()),
            account_id: Set(schedule.account_id.into_inner()),
            from_account_number: Set(schedule.from_account_number.digits().to_string()),
            to_account_number: Set(schedule.to_account_number.digits().to_string()),
            amount: Set(schedule.amount.value()),
            description: Set(schedule.description.clone()),
            scheduled_at: Set(schedule.scheduled_at),
            status: Set(schedule.status.as_str().to_string()),
            executed_at: Set(schedule.executed_at),
            failure_reason: Set(schedule.failure_reason.clone()),
            transaction_id: Set(schedule.transaction_id.map(TransactionId::into_inner)),
            claimed_at: Set(schedule.claimed_at),
            credential_version: Set(schedule.credential_version),
            created_at: Set(schedule.created_at),
        }
    }
}
