//! Notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_core::LedgerResult;
use pocketbank_core::notification::Notification;
use pocketbank_core::ports::NotificationRepository;
use pocketbank_shared::types::{AccountId, NotificationId, PageRequest, PageResponse};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};

use super::{SeaStore, fetch_page, storage};
use crate::entities::notifications::{self, Column};

#[async_trait]
impl NotificationRepository for SeaStore {
    async fn insert_notification(&self, notification: &Notification) -> LedgerResult<()> {
        notifications::Entity::insert(notifications::ActiveModel::from(notification))
            .exec_without_returning(&self.db)
            .await
            .map_err(storage)?;
        Ok(())
    }

    async fn find_notification(&self, id: NotificationId) -> LedgerResult<Option<Notification>> {
        notifications::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(notifications::Model::into_domain)
            .transpose()
    }

    async fn list_notifications(
        &self,
        account: AccountId,
        unread_only: bool,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Notification>> {
        let page = page.clamped();
        let mut query = notifications::Entity::find().filter(Column::AccountId.eq(account.into_inner()));
        if unread_only {
            query = query.filter(Column::IsRead.eq(false));
        }
        let query = query.order_by_desc(Column::CreatedAt).order_by_desc(Column::Id);
        let (rows, total) = fetch_page(&self.db, query, page).await?;
        let content = rows
            .into_iter()
            .map(notifications::Model::into_domain)
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(PageResponse::new(content, page, total))
    }

    async fn count_unread(&self, account: AccountId) -> LedgerResult<u64> {
        notifications::Entity::find()
            .filter(Column::AccountId.eq(account.into_inner()))
            .filter(Column::IsRead.eq(false))
            .count(&self.db)
            .await
            .map_err(storage)
    }

    async fn mark_read(&self, id: NotificationId, account: AccountId, now: DateTime<Utc>) -> LedgerResult<bool> {
        let owned = notifications::Entity::find()
            .filter(Column::Id.eq(id.into_inner()))
            .filter(Column::AccountId.eq(account.into_inner()))
            .count(&self.db)
            .await
            .map_err(storage)?;
        if owned == 0 {
            return Ok(false);
        }
        notifications::Entity::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .col_expr(Column::ReadAt, Expr::value(now))
            .filter(Column::Id.eq(id.into_inner()))
            .filter(Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(true)
    }

    async fn mark_all_read(&self, account: AccountId, now: DateTime<Utc>) -> LedgerResult<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(Column::IsRead, Expr::value(true))
            .col_expr(Column::ReadAt, Expr::value(now))
            .filter(Column::AccountId.eq(account.into_inner()))
            .filter(Column::IsRead.eq(false))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected)
    }

    async fn delete_notification(&self, id: NotificationId, account: AccountId) -> LedgerResult<bool> {
        let result = notifications::Entity::delete_many()
            .filter(Column::Id.eq(id.into_inner()))
            .filter(Column::AccountId.eq(account.into_inner()))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected == 1)
    }

    async fn delete_read(&self, account: AccountId) -> LedgerResult<u64> {
        let result = notifications::Entity::delete_many()
            .filter(Column::AccountId.eq(account.into_inner()))
            .filter(Column::IsRead.eq(true))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected)
    }
}
