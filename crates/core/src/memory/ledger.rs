//! Accounts and the ledger.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_shared::types::{
    AccountId, AccountNumber, Amount, PageRequest, PageResponse, TransactionId, UserId,
};

use super::{MemoryStore, State, newest_first, paginate};
use crate::ledger::{
    Account, AccountStatus, LedgerError, LedgerResult, Transaction, TransactionStatus,
    TransactionType,
};
use crate::ports::{
    AccountRepository, DepositCommand, FailureRecord, LedgerStore, Settlement, TransactionFilter,
    TransferCommand,
};
use crate::qr::QrStatus;
use crate::schedule::ScheduleStatus;

impl State {
    fn account(&self, id: AccountId) -> LedgerResult<&Account> {
        self.accounts
            .get(&id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    fn account_mut(&mut self, id: AccountId) -> LedgerResult<&mut Account> {
        self.accounts
            .get_mut(&id)
            .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))
    }

    /// Checks that the settlement subject can still be settled.
    fn check_settlement(&self, settlement: Settlement, now: DateTime<Utc>) -> LedgerResult<()> {
        match settlement {
            Settlement::None => Ok(()),
            Settlement::Qr(id) => self
                .qr_payments
                .get(&id)
                .ok_or(LedgerError::QrNotFound)?
                .ensure_payable(now),
            Settlement::Schedule(id) => match self.schedules.iter().find(|s| s.id == id) {
                Some(s) if s.status == ScheduleStatus::Executing => Ok(()),
                Some(_) => Err(LedgerError::ScheduleNotPending),
                None => Err(LedgerError::ScheduleNotFound),
            },
        }
    }

    fn set_balance(&mut self, id: AccountId, balance: Amount, now: DateTime<Utc>) -> LedgerResult<()> {
        let account = self.account_mut(id)?;
        account.balance = balance;
        account.version += 1;
        account.updated_at = now;
        Ok(())
    }
}

/// Fields of a row about to be appended.
struct Draft<'a> {
    tx_type: TransactionType,
    status: TransactionStatus,
    amount: Amount,
    description: &'a str,
    balance_after: Amount,
    settlement: Settlement,
    now: DateTime<Utc>,
}

fn new_transaction(from: &Account, to: Option<&Account>, draft: Draft<'_>) -> Transaction {
    Transaction {
        id: TransactionId::new(),
        tx_type: draft.tx_type,
        status: draft.status,
        from_account_id: from.id,
        from_account_number: from.account_number.clone(),
        from_owner_name: from.owner_name.clone(),
        to_account_id: to.map(|a| a.id),
        to_account_number: to.map(|a| a.account_number.clone()),
        to_owner_name: to.map(|a| a.owner_name.clone()),
        amount: draft.amount,
        description: draft.description.to_string(),
        balance_after: draft.balance_after,
        failure_reason: None,
        schedule_id: match draft.settlement {
            Settlement::Schedule(id) => Some(id),
            _ => None,
        },
        qr_payment_id: match draft.settlement {
            Settlement::Qr(id) => Some(id),
            _ => None,
        },
        created_at: draft.now,
    }
}

#[async_trait]
impl AccountRepository for MemoryStore {
    async fn insert_account(&self, account: &Account) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        if state.accounts.values().any(|a| {
            a.owner_id == account.owner_id || a.account_number == account.account_number
        }) {
            return Err(LedgerError::Conflict(
                "owner or account number already exists".to_string(),
            ));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn find_account(&self, id: AccountId) -> LedgerResult<Option<Account>> {
        Ok(self.state.lock().await.accounts.get(&id).cloned())
    }

    async fn find_by_owner(&self, owner: UserId) -> LedgerResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state.accounts.values().find(|a| a.owner_id == owner).cloned())
    }

    async fn find_by_number(&self, number: &AccountNumber) -> LedgerResult<Option<Account>> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .find(|a| &a.account_number == number)
            .cloned())
    }

    async fn set_status(
        &self,
        id: AccountId,
        status: AccountStatus,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(id)?;
        account.status = status;
        if status == AccountStatus::Active {
            account.failed_password_attempts = 0;
        }
        account.version += 1;
        account.updated_at = now;
        Ok(account.clone())
    }

    async fn set_simple_password(
        &self,
        id: AccountId,
        hash: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(id)?;
        account.simple_password_hash = Some(hash.to_string());
        account.credential_version += 1;
        account.failed_password_attempts = 0;
        account.version += 1;
        account.updated_at = now;
        Ok(account.clone())
    }

    async fn record_password_failure(
        &self,
        id: AccountId,
        max_attempts: u32,
        now: DateTime<Utc>,
    ) -> LedgerResult<Account> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(id)?;
        account.failed_password_attempts = account.failed_password_attempts.saturating_add(1);
        if account.failed_password_attempts >= max_attempts {
            account.status = AccountStatus::Locked;
        }
        account.version += 1;
        account.updated_at = now;
        Ok(account.clone())
    }

    async fn reset_password_failures(&self, id: AccountId, now: DateTime<Utc>) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        let account = state.account_mut(id)?;
        account.failed_password_attempts = 0;
        account.version += 1;
        account.updated_at = now;
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn apply_transfer(&self, command: &TransferCommand) -> LedgerResult<Transaction> {
        if !command.amount.is_positive() {
            return Err(LedgerError::validation("amount must be positive"));
        }
        if command.from == command.to {
            return Err(LedgerError::validation("cannot transfer to the same account"));
        }

        let mut state = self.state.lock().await;
        let from = state.account(command.from)?.clone();
        let to = state.account(command.to)?.clone();
        if !from.is_active() || !to.is_active() {
            return Err(LedgerError::AccountLocked);
        }
        state.check_settlement(command.settlement, command.now)?;

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

        let tx = new_transaction(
            &from,
            Some(&to),
            Draft {
                tx_type: command.tx_type,
                status: TransactionStatus::Completed,
                amount: command.amount,
                description: &command.description,
                balance_after: from_balance,
                settlement: command.settlement,
                now: command.now,
            },
        );

        state.set_balance(from.id, from_balance, command.now)?;
        state.set_balance(to.id, to_balance, command.now)?;
        match command.settlement {
            Settlement::None => {}
            Settlement::Qr(id) => {
                if let Some(intent) = state.qr_payments.get_mut(&id) {
                    intent.status = QrStatus::Paid;
                    intent.paid_at = Some(command.now);
                    intent.buyer_account_id = Some(from.id);
                    intent.transaction_id = Some(tx.id);
                }
            }
            Settlement::Schedule(id) => {
                if let Some(schedule) = state.schedules.iter_mut().find(|s| s.id == id) {
                    schedule.status = ScheduleStatus::Executed;
                    schedule.executed_at = Some(command.now);
                    schedule.transaction_id = Some(tx.id);
                }
            }
        }
        state.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn apply_deposit(&self, command: &DepositCommand) -> LedgerResult<Transaction> {
        if !command.amount.is_positive() {
            return Err(LedgerError::validation("amount must be positive"));
        }

        let mut state = self.state.lock().await;
        let account = state.account(command.account)?.clone();
        if !account.is_active() {
            return Err(LedgerError::AccountLocked);
        }
        let balance = account
            .balance
            .checked_add(command.amount)
            .ok_or_else(|| LedgerError::validation("balance would overflow"))?;

        let tx = new_transaction(
            &account,
            None,
            Draft {
                tx_type: command.tx_type,
                status: TransactionStatus::Completed,
                amount: command.amount,
                description: &command.description,
                balance_after: balance,
                settlement: Settlement::None,
                now: command.now,
            },
        );
        state.set_balance(account.id, balance, command.now)?;
        state.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn record_failure(&self, record: &FailureRecord) -> LedgerResult<Transaction> {
        let mut state = self.state.lock().await;
        let from = state.account(record.from)?.clone();
        let to = match record.to {
            Some(id) => state.accounts.get(&id).cloned(),
            None => None,
        };
        if matches!(record.settlement, Settlement::Schedule(_)) {
            state.check_settlement(record.settlement, record.now)?;
        }

        let mut tx = new_transaction(
            &from,
            to.as_ref(),
            Draft {
                tx_type: record.tx_type,
                status: TransactionStatus::Failed,
                amount: record.amount,
                description: &record.description,
                balance_after: from.balance,
                settlement: record.settlement,
                now: record.now,
            },
        );
        tx.failure_reason = Some(record.reason.clone());

        if let Settlement::Schedule(id) = record.settlement
            && let Some(schedule) = state.schedules.iter_mut().find(|s| s.id == id)
        {
            schedule.status = ScheduleStatus::Failed;
            schedule.failure_reason = Some(record.reason.clone());
            schedule.executed_at = Some(record.now);
            schedule.transaction_id = Some(tx.id);
        }
        state.transactions.push(tx.clone());
        Ok(tx)
    }

    async fn find_transaction(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        let state = self.state.lock().await;
        Ok(state.transactions.iter().find(|t| t.id == id).cloned())
    }

    async fn list_transactions(
        &self,
        account: AccountId,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Transaction>> {
        let state = self.state.lock().await;
        let rows = state
            .transactions
            .iter()
            .filter(|t| t.visible_to(account) && filter.matches(t))
            .cloned()
            .collect();
        Ok(paginate(newest_first(rows, |t| t.created_at), page))
    }

    async fn completed_between(
        &self,
        account: AccountId,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> LedgerResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        Ok(state
            .transactions
            .iter()
            .filter(|t| {
                t.status == TransactionStatus::Completed
                    && t.involves(account)
                    && t.created_at >= from
                    && t.created_at < until
            })
            .cloned()
            .collect())
    }
}
