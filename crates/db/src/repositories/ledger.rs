//! Ledger store: balance moves and the append-only transaction log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_core::ledger::{Account, Transaction, TransactionStatus, TransactionType};
use pocketbank_core::ports::{
    DepositCommand, FailureRecord, LedgerStore, Settlement, TransactionFilter, TransferCommand,
};
use pocketbank_core::qr::QrStatus;
use pocketbank_core::schedule::ScheduleStatus;
use pocketbank_core::{LedgerError, LedgerResult};
use pocketbank_shared::types::{AccountId, Amount, PageRequest, PageResponse, TransactionId};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::{
    ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    TransactionTrait,
};
use tracing::{debug, info};

use super::account::{lock_account, store_account};
use super::{SeaStore, fetch_page, storage};
use crate::entities::{accounts, qr_payments, scheduled_transfers, transactions};

/// Fields of a row about to be appended.
struct Posting<'a> {
    tx_type: TransactionType,
    status: TransactionStatus,
    amount: Amount,
    description: &'a str,
    balance_after: Amount,
    settlement: Settlement,
    now: DateTime<Utc>,
}

impl Posting<'_> {
    fn into_transaction(self, from: &Account, to: Option<&Account>) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            tx_type: self.tx_type,
            status: self.status,
            from_account_id: from.id,
            from_account_number: from.account_number.clone(),
            from_owner_name: from.owner_name.clone(),
            to_account_id: to.map(|a| a.id),
            to_account_number: to.map(|a| a.account_number.clone()),
            to_owner_name: to.map(|a| a.owner_name.clone()),
            amount: self.amount,
            description: self.description.to_string(),
            balance_after: self.balance_after,
            failure_reason: None,
            schedule_id: match self.settlement {
                Settlement::Schedule(id) => Some(id),
                _ => None,
            },
            qr_payment_id: match self.settlement {
                Settlement::Qr(id) => Some(id),
                _ => None,
            },
            created_at: self.now,
        }
    }
}

async fn append(txn: &DatabaseTransaction, tx: &Transaction) -> LedgerResult<()> {
    transactions::Entity::insert(transactions::ActiveModel::from(tx))
        .exec_without_returning(txn)
        .await
        .map_err(storage)?;
    Ok(())
}

/// Writes a new balance with a version check.
async fn write_balance(
    txn: &DatabaseTransaction,
    account: &Account,
    balance: Amount,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    let mut updated = account.clone();
    updated.balance = balance;
    updated.version += 1;
    updated.updated_at = now;
    store_account(txn, &updated, account.version).await
}

/// Checks that the settlement subject can still be settled, locking its row.
async fn check_settlement(
    txn: &DatabaseTransaction,
    settlement: Settlement,
    now: DateTime<Utc>,
) -> LedgerResult<()> {
    match settlement {
        Settlement::None => Ok(()),
        Settlement::Qr(id) => qr_payments::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(txn)
            .await
            .map_err(storage)?
            .ok_or(LedgerError::QrNotFound)?
            .into_domain()?
            .ensure_payable(now),
        Settlement::Schedule(id) => {
            let schedule = scheduled_transfers::Entity::find_by_id(id.into_inner())
                .lock_exclusive()
                .one(txn)
                .await
                .map_err(storage)?
                .ok_or(LedgerError::ScheduleNotFound)?;
            if schedule.status == ScheduleStatus::Executing.as_str() {
                Ok(())
            } else {
                Err(LedgerError::ScheduleNotPending)
            }
        }
    }
}

/// Flips the subject to its settled state. Fails if someone else got there
/// first.
async fn settle(
    txn: &DatabaseTransaction,
    settlement: Settlement,
    tx: &Transaction,
    buyer: AccountId,
) -> LedgerResult<()> {
    let rows = match settlement {
        Settlement::None => return Ok(()),
        Settlement::Qr(id) => {
            qr_payments::Entity::update_many()
                .col_expr(qr_payments::Column::Status, Expr::value(QrStatus::Paid.as_str()))
                .col_expr(qr_payments::Column::PaidAt, Expr::value(tx.created_at))
                .col_expr(qr_payments::Column::BuyerAccountId, Expr::value(buyer.into_inner()))
                .col_expr(qr_payments::Column::TransactionId, Expr::value(tx.id.into_inner()))
                .filter(qr_payments::Column::Id.eq(id.into_inner()))
                .filter(qr_payments::Column::Status.eq(QrStatus::Pending.as_str()))
                .exec(txn)
                .await
                .map_err(storage)?
                .rows_affected
        }
        Settlement::Schedule(id) => {
            let (status, reason) = match tx.status {
                TransactionStatus::Completed => (ScheduleStatus::Executed, None),
                TransactionStatus::Failed => (ScheduleStatus::Failed, tx.failure_reason.clone()),
            };
            scheduled_transfers::Entity::update_many()
                .col_expr(scheduled_transfers::Column::Status, Expr::value(status.as_str()))
                .col_expr(scheduled_transfers::Column::ExecutedAt, Expr::value(tx.created_at))
                .col_expr(scheduled_transfers::Column::FailureReason, Expr::value(reason))
                .col_expr(
                    scheduled_transfers::Column::TransactionId,
                    Expr::value(tx.id.into_inner()),
                )
                .filter(scheduled_transfers::Column::Id.eq(id.into_inner()))
                .filter(scheduled_transfers::Column::Status.eq(ScheduleStatus::Executing.as_str()))
                .exec(txn)
                .await
                .map_err(storage)?
                .rows_affected
        }
    };
    if rows == 1 {
        Ok(())
    } else if matches!(settlement, Settlement::Qr(_)) {
        Err(LedgerError::QrAlreadyUsed)
    } else {
        Err(LedgerError::ScheduleNotPending)
    }
}

fn visible_to(account: AccountId) -> Condition {
    let id = account.into_inner();
    Condition::any()
        .add(transactions::Column::FromAccountId.eq(id))
        .add(
            Condition::all()
                .add(transactions::Column::ToAccountId.eq(id))
                .add(transactions::Column::Status.eq(TransactionStatus::Completed.as_str())),
        )
}

#[async_trait]
impl LedgerStore for SeaStore {
    async fn apply_transfer(&self, command: &TransferCommand) -> LedgerResult<Transaction> {
        if !command.amount.is_positive() {
            return Err(LedgerError::validation("amount must be positive"));
        }
        if command.from == command.to {
            return Err(LedgerError::validation("cannot transfer to the same account"));
        }

        let txn = self.db.begin().await.map_err(storage)?;
        let (first, second) = if command.from < command.to {
            (command.from, command.to)
        } else {
            (command.to, command.from)
        };
        let first = lock_account(&txn, first).await?;
        let second = lock_account(&txn, second).await?;
        let (from, to) = if first.id == command.from {
            (first, second)
        } else {
            (second, first)
        };
        if !from.is_active() || !to.is_active() {
            return Err(LedgerError::AccountLocked);
        }
        check_settlement(&txn, command.settlement, command.now).await?;

        let from_balance = from
            .balance
            .checked_sub(command.amount)
            .filter(|b| !b.is_negative())
            .ok_or(LedgerError::InsufficientFunds {
                balance: from.balance,
                requested: command.amount,
            })?;
        let to_balance = to
            .balance
            .checked_add(command.amount)
            .ok_or_else(|| LedgerError::validation("recipient balance would overflow"))?;

        let tx = Posting {
            tx_type: command.tx_type,
            status: TransactionStatus::Completed,
            amount: command.amount,
            description: &command.description,
            balance_after: from_balance,
            settlement: command.settlement,
            now: command.now,
        }
        .into_transaction(&from, Some(&to));

        write_balance(&txn, &from, from_balance, command.now).await?;
        write_balance(&txn, &to, to_balance, command.now).await?;
        append(&txn, &tx).await?;
        settle(&txn, command.settlement, &tx, from.id).await?;
        txn.commit().await.map_err(storage)?;

        info!(transaction_id = %tx.id, from = %from.id, to = %to.id, amount = %command.amount, "transfer posted");
        Ok(tx)
    }

    async fn apply_deposit(&self, command: &DepositCommand) -> LedgerResult<Transaction> {
        if !command.amount.is_positive() {
            return Err(LedgerError::validation("amount must be positive"));
        }

        let txn = self.db.begin().await.map_err(storage)?;
        let account = lock_account(&txn, command.account).await?;
        if !account.is_active() {
            return Err(LedgerError::AccountLocked);
        }
        let balance = account
            .balance
            .checked_add(command.amount)
            .ok_or_else(|| LedgerError::validation("balance would overflow"))?;

        let tx = Posting {
            tx_type: command.tx_type,
            status: TransactionStatus::Completed,
            amount: command.amount,
            description: &command.description,
            balance_after: balance,
            settlement: Settlement::None,
            now: command.now,
        }
        .into_transaction(&account, None);

        write_balance(&txn, &account, balance, command.now).await?;
        append(&txn, &tx).await?;
        txn.commit().await.map_err(storage)?;

        info!(transaction_id = %tx.id, account_id = %account.id, amount = %command.amount, "deposit posted");
        Ok(tx)
    }

    async fn record_failure(&self, record: &FailureRecord) -> LedgerResult<Transaction> {
        let txn = self.db.begin().await.map_err(storage)?;
        let from = lock_account(&txn, record.from).await?;
        let to = match record.to {
            Some(id) => accounts::Entity::find_by_id(id.into_inner())
                .one(&txn)
                .await
                .map_err(storage)?
                .map(accounts::Model::into_domain)
                .transpose()?,
            None => None,
        };
        if matches!(record.settlement, Settlement::Schedule(_)) {
            check_settlement(&txn, record.settlement, record.now).await?;
        }

        let mut tx = Posting {
            tx_type: record.tx_type,
            status: TransactionStatus::Failed,
            amount: record.amount,
            description: &record.description,
            balance_after: from.balance,
            settlement: record.settlement,
            now: record.now,
        }
        .into_transaction(&from, to.as_ref());
        tx.failure_reason = Some(record.reason.clone());

        append(&txn, &tx).await?;
        if matches!(record.settlement, Settlement::Schedule(_)) {
            settle(&txn, record.settlement, &tx, from.id).await?;
        }
        txn.commit().await.map_err(storage)?;

        debug!(transaction_id = %tx.id, reason = %record.reason, "failure recorded");
        Ok(tx)
    }

    async fn find_transaction(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(storage)?
            .map(transactions::Model::into_domain)
            .transpose()
    }

    async fn list_transactions(
        &self,
        account: AccountId,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Transaction>> {
        let page = page.clamped();
        let mut query = transactions::Entity::find().filter(visible_to(account));
        if let Some(tx_type) = filter.tx_type {
            query = query.filter(transactions::Column::TxType.eq(tx_type.as_str()));
        }
        if let Some(start) = filter.starts_at() {
            query = query.filter(transactions::Column::CreatedAt.gte(start));
        }
        if let Some(end) = filter.ends_before() {
            query = query.filter(transactions::Column::CreatedAt.lt(end));
        }
        let query = query
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id);

        let (rows, total) = fetch_page(&self.db, query, page).await?;
        let content = rows
            .into_iter()
            .map(transactions::Model::into_domain)
            .collect::<LedgerResult<Vec<_>>>()?;
        Ok(PageResponse::new(content, page, total))
    }

    async fn completed_between(
        &self,
        account: AccountId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>> {
        let id = account.into_inner();
        transactions::Entity::find()
            .filter(transactions::Column::Status.eq(TransactionStatus::Completed.as_str()))
            .filter(
                Condition::any()
                    .add(transactions::Column::FromAccountId.eq(id))
                    .add(transactions::Column::ToAccountId.eq(id)),
            )
            .filter(transactions::Column::CreatedAt.gte(from))
            .filter(transactions::Column::CreatedAt.lt(until))
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(storage)?
            .into_iter()
            .map(transactions::Model::into_domain)
            .collect()
    }
}
