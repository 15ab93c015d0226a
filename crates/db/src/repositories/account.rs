//! Account repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_core::ledger::{Account, AccountStatus};
use pocketbank_core::ports::AccountRepository;
use pocketbank_core::{LedgerError, LedgerResult};
use pocketbank_shared::types::{AccountId, AccountNumber, UserId};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect,
    TransactionTrait,
};
use tracing::debug;

use super::{SeaStore, conflict_or_storage, storage};
use crate::entities::accounts;

/// Reads an account row under `SELECT ... FOR UPDATE`.
pub(crate) async fn lock_account(txn: &DatabaseTransaction, id: AccountId) -> LedgerResult<Account> {
    accounts::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(storage)?
        .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?
        .into_domain()
}

/// Writes `account` back if its stored version is still `expected_version`.
pub(crate) async fn store_account<C: ConnectionTrait>(
    conn: &C,
    account: &Account,
    expected_version: i64,
) -> LedgerResult<()> {
    let result = accounts::Entity::update_many()
        .set(accounts::ActiveModel::from(account))
        .filter(accounts::Column::Id.eq(account.id.into_inner()))
        .filter(accounts::Column::Version.eq(expected_version))
        .exec(conn)
        .await
        .map_err(storage)?;
    if result.rows_affected == 0 {
        debug!(account_id = %account.id, expected_version, "account version moved");
        return Err(LedgerError::ConcurrentModification);
    }
    Ok(())
}

impl SeaStore {
    /// Locks one account, applies `change`, bumps the version and commits.
    async fn mutate_account<F>(&self, id: AccountId, now: DateTime<Utc>, change: F) -> LedgerResult<Account>
    where
        F: FnOnce(&mut Account) + Send,
    {
        let txn = self.db.begin().await.map_err(storage)?;
        let mut account = lock_account(&txn, id).await?;
        let expected_version = account.version;
        change(&mut account);
        account.version += 1;
        account.updated_at = now;
        store_account(&txn, &account, expected_version).await?;
        txn.commit().await.map_err(storage)?;
        Ok(account)
    }

    async fn find_account_where(
        &self,
        filter: impl sea_orm::sea_query::IntoCondition + Send,
    ) -> LedgerResult<Option<Account>> {
        accounts::Entity::find()
            .filter(filter)
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(accounts::Model::into_domain)
            .transpose()
    }
}

#[async_trait]
impl AccountRepository for SeaStore {
    async fn insert_account(&self, account: &Account) -> LedgerResult<()> {
        accounts::Entity::insert(accounts::ActiveModel::from(account))
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| conflict_or_storage(e, "account"))?;
        Ok(())
    }

    async fn find_account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        self.find_account_where(accounts::Column::Id.eq(id.into_inner()))
            .await
    }

    async fn find_by_owner(&self, owner: UserId) -> LedgerResult<Option<Account>> {
        self.find_account_where(accounts::Column::OwnerId.eq(owner.into_inner()))
            .await
    }

    async fn find_by_number(&self, number: &AccountNumber) -> LedgerResult<Option<Account>> {
        self.find_account_where(accounts::Column::AccountNumber.eq(number.digits()))
            .await
    }

    async fn set_status(
        &self,
        id: AccountId,
        status: AccountStatus,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account> {
        self.mutate_account(id, now, |account| {
            account.status = status;
            if status == AccountStatus::Active {
                account.failed_password_attempts = 0;
            }
        })
        .await
    }

    async fn set_simple_password(
        &self,
        id: AccountId,
        hash: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account> {
        let hash = hash.to_string();
        self.mutate_account(id, now, move |account| {
            account.simple_password_hash = Some(hash);
            account.credential_version += 1;
            account.failed_password_attempts = 0;
        })
        .await
    }

    async fn record_password_failure(
        &self,
        id: AccountId,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account> {
        self.mutate_account(id, now, |account| {
            account.failed_password_attempts = account.failed_password_attempts.saturating_add(1);
            if account.failed_password_attempts >= max_attempts {
                account.status = AccountStatus::Locked;
            }
        })
        .await
    }

    async fn reset_password_failures(&self, id: AccountId, now: DateTime<Utc>) -> LedgerResult<()> {
        self.mutate_account(id, now, |account| account.failed_password_attempts = 0)
            .await
            .map(|_| ())
    }
}
