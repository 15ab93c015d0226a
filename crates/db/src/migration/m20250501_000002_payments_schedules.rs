//! QR payment intents, scheduled transfers and idempotency records.

use sea_orm_migration::prelude::*;

use super::m20250501_000001_accounts_ledger::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QrPayments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(QrPayments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(QrPayments::Code).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(QrPayments::SellerAccountId).uuid().not_null())
                    .col(ColumnDef::new(QrPayments::SellerAccountNumber).string_len(12).not_null())
                    .col(ColumnDef::new(QrPayments::SellerName).string_len(100).not_null())
                    .col(ColumnDef::new(QrPayments::Amount).big_integer().not_null())
                    .col(ColumnDef::new(QrPayments::Description).string_len(200).not_null())
                    .col(ColumnDef::new(QrPayments::Status).string_len(16).not_null())
                    .col(ColumnDef::new(QrPayments::ExpiresAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(QrPayments::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(QrPayments::PaidAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(QrPayments::BuyerAccountId).uuid().null())
                    .col(ColumnDef::new(QrPayments::TransactionId).uuid().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_qr_payments_seller")
                            .from(QrPayments::Table, QrPayments::SellerAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ScheduledTransfers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ScheduledTransfers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ScheduledTransfers::AccountId).uuid().not_null())
                    .col(
                        ColumnDef::new(ScheduledTransfers::FromAccountNumber)
                            .string_len(12)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledTransfers::ToAccountNumber)
                            .string_len(12)
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduledTransfers::Amount).big_integer().not_null())
                    .col(ColumnDef::new(ScheduledTransfers::Description).string_len(200).not_null())
                    .col(
                        ColumnDef::new(ScheduledTransfers::ScheduledAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduledTransfers::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(ScheduledTransfers::ExecutedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(ScheduledTransfers::FailureReason).string_len(64).null())
                    .col(ColumnDef::new(ScheduledTransfers::TransactionId).uuid().null())
                    .col(
                        ColumnDef::new(ScheduledTransfers::ClaimedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledTransfers::CredentialVersion)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ScheduledTransfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scheduled_transfers_account")
                            .from(ScheduledTransfers::Table, ScheduledTransfers::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scheduled_transfers_due")
                    .table(ScheduledTransfers::Table)
                    .col(ScheduledTransfers::Status)
                    .col(ScheduledTransfers::ScheduledAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(IdempotencyRecords::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(IdempotencyRecords::Scope).string_len(128).not_null())
                    .col(ColumnDef::new(IdempotencyRecords::Key).string_len(128).not_null())
                    .col(ColumnDef::new(IdempotencyRecords::Response).json().not_null())
                    .col(
                        ColumnDef::new(IdempotencyRecords::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(IdempotencyRecords::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(IdempotencyRecords::Scope)
                            .col(IdempotencyRecords::Key),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(IdempotencyRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ScheduledTransfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(QrPayments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum QrPayments {
    Table,
    Id,
    Code,
    SellerAccountId,
    SellerAccountNumber,
    SellerName,
    Amount,
    Description,
    Status,
    ExpiresAt,
    CreatedAt,
    PaidAt,
    BuyerAccountId,
    TransactionId,
}

#[derive(DeriveIden)]
enum ScheduledTransfers {
    Table,
    Id,
    AccountId,
    FromAccountNumber,
    ToAccountNumber,
    Amount,
    Description,
    ScheduledAt,
    Status,
    ExecutedAt,
    FailureReason,
    TransactionId,
    ClaimedAt,
    CredentialVersion,
    CreatedAt,
}

#[derive(DeriveIden)]
enum IdempotencyRecords {
    Table,
    Scope,
    Key,
    Response,
    CreatedAt,
    ExpiresAt,
}
