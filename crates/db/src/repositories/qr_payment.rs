//! QR payment intent repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_core::LedgerResult;
use pocketbank_core::ports::QrPaymentRepository;
use pocketbank_core::qr::{QrPaymentIntent, QrStatus};
use pocketbank_shared::types::QrPaymentId;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use super::{SeaStore, conflict_or_storage, storage};
use crate::entities::qr_payments;

#[async_trait]
impl QrPaymentRepository for SeaStore {
    async fn insert_intent(&self, intent: &QrPaymentIntent) -> LedgerResult<()> {
        qr_payments::Entity::insert(qr_payments::ActiveModel::from(intent))
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| conflict_or_storage(e, "QR code"))?;
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> LedgerResult<Option<QrPaymentIntent>> {
        qr_payments::Entity::find()
            .filter(qr_payments::Column::Code.eq(code))
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(qr_payments::Model::into_domain)
            .transpose()
    }

    async fn find_intent(&self, id: QrPaymentId) -> LedgerResult<Option<QrPaymentIntent>> {
        qr_payments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(qr_payments::Model::into_domain)
            .transpose()
    }

    async fn expire_intent(&self, id: QrPaymentId, now: DateTime<Utc>) -> LedgerResult<bool> {
        let result = qr_payments::Entity::update_many()
            .col_expr(qr_payments::Column::Status, Expr::value(QrStatus::Expired.as_str()))
            .filter(qr_payments::Column::Id.eq(id.into_inner()))
            .filter(qr_payments::Column::Status.eq(QrStatus::Pending.as_str()))
            .filter(qr_payments::Column::ExpiresAt.lte(now))
            .exec(&self.db)
            .await
            .map_err(storage)?;
        Ok(result.rows_affected == 1)
    }
}
