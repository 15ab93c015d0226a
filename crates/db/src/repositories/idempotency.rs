//! Idempotency record repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_core::LedgerResult;
use pocketbank_core::guard::IdempotencyRecord;
use pocketbank_core::ports::IdempotencyRepository;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, SqlErr, TransactionTrait};
use tracing::debug;

use super::{SeaStore, storage};
use crate::entities::idempotency_records::{self, Column};

#[async_trait]
impl IdempotencyRepository for SeaStore {
    async fn find_record(
        &self,
        scope: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<IdempotencyRecord>> {
        let record = idempotency_records::Entity::find_by_id((scope.to_string(), key.to_string()))
            .filter(Column::ExpiresAt.gt(now))
            .one(&self.db)
            .await
            .map_err(storage)?;
        Ok(record.map(IdempotencyRecord::from))
    }

    async fn save_record(&self, record: &IdempotencyRecord) -> LedgerResult<()> {
        let txn = self.db.begin().await.map_err(storage)?;
        idempotency_records::Entity::delete_many()
            .filter(Column::Scope.eq(record.scope.as_str()))
            .filter(Column::Key.eq(record.key.as_str()))
            .filter(Column::ExpiresAt.lte(record.created_at))
            .exec(&txn)
            .await
            .map_err(storage)?;
        let inserted = idempotency_records::Entity::insert(idempotency_records::ActiveModel::from(record))
            .exec_without_returning(&txn)
            .await;
        match inserted {
            Ok(_) => {}
            // A live record with the same key wins.
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(scope = %record.scope, "idempotency record already stored");
                return Ok(());
            }
            Err(e) => return Err(storage(e)),
        }
        txn.commit().await.map_err(storage)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> LedgerResult<u64> {
        let result = idempotency_records::Entity::delete_many()
            .filter(Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected)
    }
}
