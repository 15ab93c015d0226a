//! Favorite recipient repository.

use async_trait::async_trait;
use pocketbank_core::favorite::Favorite;
use pocketbank_core::ports::FavoriteRepository;
use pocketbank_core::{LedgerError, LedgerResult};
use pocketbank_shared::types::{AccountId, FavoriteId};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use super::{SeaStore, conflict_or_storage, storage};
use crate::entities::favorites::{self, Column};

#[async_trait]
impl FavoriteRepository for SeaStore {
    async fn insert_favorite(&self, favorite: &Favorite) -> LedgerResult<()> {
        favorites::Entity::insert(favorites::ActiveModel::from(favorite))
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| conflict_or_storage(e, "favorite"))?;
        Ok(())
    }

    async fn find_favorite(&self, id: FavoriteId) -> LedgerResult<Option<Favorite>> {
        favorites::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(favorites::Model::into_domain)
            .transpose()
    }

    async fn list_favorites(&self, account: AccountId) -> LedgerResult<Vec<Favorite>> {
        favorites::Entity::find()
            .filter(Column::AccountId.eq(account.into_inner()))
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(favorites::Model::into_domain)
            .collect()
    }

    async fn update_favorite(&self, favorite: &Favorite) -> LedgerResult<()> {
        let result = favorites::Entity::update_many()
            .col_expr(Column::Nickname, Expr::value(favorite.nickname.clone()))
            .col_expr(Column::Memo, Expr::value(favorite.memo.clone()))
            .filter(Column::Id.eq(favorite.id.into_inner()))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::NotFound(format!("favorite {}", favorite.id)));
        }
        Ok(())
    }

    async fn delete_favorite(&self, id: FavoriteId, account: AccountId) -> LedgerResult<bool> {
        let result = favorites::Entity::delete_many()
            .filter(Column::Id.eq(id.into_inner()))
            .filter(Column::AccountId.eq(account.into_inner()))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected == 1)
    }
}
