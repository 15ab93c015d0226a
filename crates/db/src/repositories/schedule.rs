//! Scheduled transfer repository.
//!
//! Every transition is a single `UPDATE ... WHERE status = <expected>`; the
//! caller that sees one affected row won.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_core::LedgerResult;
use pocketbank_core::ports::ScheduleRepository;
use pocketbank_core::schedule::{ScheduleStatus, ScheduledTransfer};
use pocketbank_shared::types::{AccountId, PageRequest, PageResponse, ScheduleId};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use tracing::info;

use super::{SeaStore, fetch_page, storage};
use crate::entities::scheduled_transfers::{self, Column};

impl SeaStore {
    /// Applies `update` to `id` only while it is still in `from`.
    async fn transition(
        &self,
        id: ScheduleId,
        from: ScheduleStatus,
        update: sea_orm::UpdateMany<scheduled_transfers::Entity>,
    ) -> LedgerResult<bool> {
        let result = update
            .filter(Column::Id.eq(id.into_inner()))
            .filter(Column::Status.eq(from.as_str()))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected == 1)
    }
}

fn set_status(status: ScheduleStatus) -> sea_orm::UpdateMany<scheduled_transfers::Entity> {
    scheduled_transfers::Entity::update_many().col_expr(Column::Status, Expr::value(status.as_str()))
}

#[async_trait]
impl ScheduleRepository for SeaStore {
    async fn insert_schedule(&self, schedule: &ScheduledTransfer) -> LedgerResult<()> {
        scheduled_transfers::Entity::insert(scheduled_transfers::ActiveModel::from(schedule))
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn find_schedule(&self, id: ScheduleId) -> LedgerResult<Option<ScheduledTransfer>> {
        scheduled_transfers::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(scheduled_transfers::Model::into_domain)
            .transpose()
    }

    async fn list_schedules(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<ScheduledTransfer>> {
        let page = page.clamped();
        let query = scheduled_transfers::Entity::find()
            .filter(Column::AccountId.eq(account.into_inner()))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id);
        let (rows, total) = fetch_page(&self.db, query, page).await?;
        let content = rows
            .into_iter()
            .map(scheduled_transfers::Model::into_domain)
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(PageResponse::new(content, page, total))
    }

    async fn find_due(&self, now: DateTime<Utc>, limit: u64) -> LedgerResult<Vec<ScheduledTransfer>> {
        scheduled_transfers::Entity::find()
            .filter(Column::Status.eq(ScheduleStatus::Pending.as_str()))
            .filter(Column::ScheduledAt.lte(now))
            .order_by_asc(Column::ScheduledAt)
            .order_by_asc(Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(scheduled_transfers::Model::into_domain)
            .collect()
    }

    async fn claim(&self, id: ScheduleId, now: DateTime<Utc>) -> LedgerResult<bool> {
        self.transition(
            id,
            ScheduleStatus::Pending,
            set_status(ScheduleStatus::Executing).col_expr(Column::ClaimedAt, Expr::value(now)),
        )
        .await
    }

    async fn release_claim(&self, id: ScheduleId) -> LedgerResult<bool> {
        self.transition(
            id,
            ScheduleStatus::Executing,
            set_status(ScheduleStatus::Pending)
                .col_expr(Column::ClaimedAt, Expr::value(Option::<DateTime<Utc>>::None)),
        )
        .await
    }

    async fn cancel(&self, id: ScheduleId, owner: AccountId) -> LedgerResult<bool> {
        self.transition(
            id,
            ScheduleStatus::Pending,
            set_status(ScheduleStatus::Cancelled).filter(Column::AccountId.eq(owner.into_inner())),
        )
        .await
    }

    async fn mark_failed(&self, id: ScheduleId, reason: &str, now: DateTime<Utc>) -> LedgerResult<bool> {
        self.transition(
            id,
            ScheduleStatus::Executing,
            set_status(ScheduleStatus::Failed)
                .col_expr(Column::FailureReason, Expr::value(reason))
                .col_expr(Column::ExecutedAt, Expr::value(now)),
        )
        .await
    }

    async fn release_stale_claims(&self, claimed_before: DateTime<Utc>) -> LedgerResult<u64> {
        let result = set_status(ScheduleStatus::Pending)
            .col_expr(Column::ClaimedAt, Expr::value(Option::<DateTime<Utc>>::None))
            .filter(Column::Status.eq(ScheduleStatus::Executing.as_str()))
            .filter(
                Condition::any()
                    .add(Column::ClaimedAt.is_null())
                    .add(Column::ClaimedAt.lt(claimed_before)),
            )
            .exec(&self.db)
            .await
            .map_err(storage)?;
        if result.rows_affected > 0 {
            info!(released = result.rows_affected, "stale schedule claims released");
        }
        Ok(result.rows_affected)
    }
}
