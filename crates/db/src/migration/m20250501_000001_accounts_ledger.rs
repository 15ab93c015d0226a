//! Accounts and the append-only transaction log.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Accounts::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Accounts::OwnerId).uuid().not_null().unique_key())
                    .col(ColumnDef::new(Accounts::OwnerName).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Accounts::AccountNumber)
                            .string_len(12)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Accounts::Balance).gte(0)),
                    )
                    .col(ColumnDef::new(Accounts::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Accounts::SimplePasswordHash).text().null())
                    .col(
                        ColumnDef::new(Accounts::FailedPasswordAttempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Accounts::CredentialVersion)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Accounts::Version).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp_with_time_zone().not_null())
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp_with_time_zone().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Transactions::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Transactions::TxType).string_len(32).not_null())
                    .col(ColumnDef::new(Transactions::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Transactions::FromAccountId).uuid().not_null())
                    .col(ColumnDef::new(Transactions::FromAccountNumber).string_len(12).not_null())
                    .col(ColumnDef::new(Transactions::FromOwnerName).string_len(100).not_null())
                    .col(ColumnDef::new(Transactions::ToAccountId).uuid().null())
                    .col(ColumnDef::new(Transactions::ToAccountNumber).string_len(12).null())
                    .col(ColumnDef::new(Transactions::ToOwnerName).string_len(100).null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transactions::Amount).gt(0)),
                    )
                    .col(ColumnDef::new(Transactions::Description).string_len(200).not_null())
                    .col(ColumnDef::new(Transactions::BalanceAfter).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::FailureReason).string_len(64).null())
                    .col(ColumnDef::new(Transactions::ScheduleId).uuid().null())
                    .col(ColumnDef::new(Transactions::QrPaymentId).uuid().null())
                    .col(ColumnDef::new(Transactions::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_from_account")
                            .from(Transactions::Table, Transactions::FromAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_to_account")
                            .from(Transactions::Table, Transactions::ToAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_from_created")
                    .table(Transactions::Table)
                    .col(Transactions::FromAccountId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_to_created")
                    .table(Transactions::Table)
                    .col(Transactions::ToAccountId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum Accounts {
    Table,
    Id,
    OwnerId,
    OwnerName,
    AccountNumber,
    Balance,
    Status,
    SimplePasswordHash,
    FailedPasswordAttempts,
    CredentialVersion,
    Version,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    TxType,
    Status,
    FromAccountId,
    FromAccountNumber,
    FromOwnerName,
    ToAccountId,
    ToAccountNumber,
    ToOwnerName,
    Amount,
    Description,
    BalanceAfter,
    FailureReason,
    ScheduleId,
    QrPaymentId,
    CreatedAt,
}
