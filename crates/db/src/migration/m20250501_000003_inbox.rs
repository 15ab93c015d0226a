//! Notifications and favorite recipients.

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
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Notifications::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Notifications::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Notifications::NotificationType).string_len(40).not_null())
                    .col(ColumnDef::new(Notifications::Title).string_len(100).not_null())
                    .col(ColumnDef::new(Notifications::Content).text().not_null())
                    .col(ColumnDef::new(Notifications::Amount).big_integer().null())
                    .col(ColumnDef::new(Notifications::RelatedTransactionId).uuid().null())
                    .col(
                        ColumnDef::new(Notifications::IsRead)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Notifications::ReadAt).timestamp_with_time_zone().null())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_notifications_account")
                            .from(Notifications::Table, Notifications::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_account_created")
                    .table(Notifications::Table)
                    .col(Notifications::AccountId)
                    .col(Notifications::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Favorites::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Favorites::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Favorites::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Favorites::AccountNumber).string_len(12).not_null())
                    .col(ColumnDef::new(Favorites::Nickname).string_len(30).not_null())
                    .col(ColumnDef::new(Favorites::Memo).string_len(200).null())
                    .col(ColumnDef::new(Favorites::CreatedAt).timestamp_with_time_zone().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorites_account")
                            .from(Favorites::Table, Favorites::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_favorites_account_number")
                    .table(Favorites::Table)
                    .col(Favorites::AccountId)
                    .col(Favorites::AccountNumber)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Favorites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Notifications {
    Table,
    Id,
    AccountId,
    NotificationType,
    Title,
    Content,
    Amount,
    RelatedTransactionId,
    IsRead,
    ReadAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Favorites {
    Table,
    Id,
    AccountId,
    AccountNumber,
    Nickname,
    Memo,
    CreatedAt,
}
