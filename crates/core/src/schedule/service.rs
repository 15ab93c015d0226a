//! Owner-facing scheduled transfer operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pocketbank_shared::types::{AccountNumber, Amount, PageRequest, PageResponse, ScheduleId, UserId};
use serde::Deserialize;
use tracing::{info, instrument};

use super::types::{ScheduleStatus, ScheduledTransfer};
use crate::account::require_account;
use crate::auth::{SimplePassword, SimplePasswords};
use crate::clock::Clock;
use crate::guard::{IdempotencyGuard, IdempotentResult};
use crate::ledger::validation::{
    MAX_SCHEDULED_AMOUNT, normalize_description, validate_amount, validate_schedule_window,
};
use crate::ledger::{Account, LedgerError, LedgerResult};
use crate::ports::Repositories;

/// Smallest scheduled amount: anything positive.
const MIN_SCHEDULED_AMOUNT: Amount = Amount::new(1);

/// Schedule a transfer for later.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    /// Destination account number.
    pub to_account_number: AccountNumber,
    /// Amount in won, at most 1,000,000.
    pub amount: Amount,
    /// Owner's simple password.
    pub simple_password: SimplePassword,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Due time, between one minute and one year from now.
    pub scheduled_at: DateTime<Utc>,
}

/// Creates, lists and cancels the caller's scheduled transfers.
pub struct ScheduleService {
    repos: Arc<dyn Repositories>,
    pins: Arc<SimplePasswords>,
    idempotency: Arc<IdempotencyGuard>,
    clock: Arc<dyn Clock>,
}

impl ScheduleService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        repos: Arc<dyn Repositories>,
        pins: Arc<SimplePasswords>,
        idempotency: Arc<IdempotencyGuard>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repos,
            pins,
            idempotency,
            clock,
        }
    }

    /// Schedules a transfer. The PIN is checked now; execution later
    /// requires the same credential version.
    #[instrument(skip(self, request, key), fields(user = %user, amount = %request.amount), err)]
    pub async fn create(
        &self,
        user: UserId,
        request: CreateScheduleRequest,
        key: Option<&str>,
    ) -> LedgerResult<IdempotentResult<ScheduledTransfer>> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.idempotency
            .run(account.id, "schedule", key, || self.insert(account.clone(), request))
            .await
    }

    async fn insert(
        &self,
        account: Account,
        request: CreateScheduleRequest,
    ) -> LedgerResult<ScheduledTransfer> {
        let now = self.clock.now();
        validate_amount(request.amount, MIN_SCHEDULED_AMOUNT, MAX_SCHEDULED_AMOUNT)?;
        validate_schedule_window(request.scheduled_at, now)?;
        let description = normalize_description(request.description.as_deref())?;

        let recipient = self
            .repos
            .accounts()
            .find_by_number(&request.to_account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(request.to_account_number.to_string()))?;
        if recipient.id == account.id {
            return Err(LedgerError::validation(
                "cannot schedule a transfer to the same account",
            ));
        }

        self.pins
            .verify(&account, request.simple_password.expose())
            .await?;

        let schedule = ScheduledTransfer {
            id: ScheduleId::new(),
            account_id: account.id,
            from_account_number: account.account_number,
            to_account_number: recipient.account_number,
            amount: request.amount,
            description,
            scheduled_at: request.scheduled_at,
            status: ScheduleStatus::Pending,
            executed_at: None,
            failure_reason: None,
            transaction_id: None,
            claimed_at: None,
            credential_version: account.credential_version,
            created_at: now,
        };
        self.repos.schedules().insert_schedule(&schedule).await?;
        info!(schedule_id = %schedule.id, scheduled_at = %schedule.scheduled_at, "transfer scheduled");
        Ok(schedule)
    }

    /// Cancels a PENDING schedule. Loses to a claim that got there first.
    #[instrument(skip(self), err)]
    pub async fn cancel(&self, user: UserId, id: ScheduleId) -> LedgerResult<ScheduledTransfer> {
        let account = require_account(self.repos.as_ref(), user).await?;
        let schedule = self.owned(&account, id).await?;
        if schedule.status != ScheduleStatus::Pending {
            return Err(LedgerError::ScheduleNotPending);
        }

        if !self
            .repos
            .schedules()
            .cancel(id, account.id)
            .await?
        {
            return Err(LedgerError::ScheduleNotPending);
        }
        info!(schedule_id = %id, "scheduled transfer cancelled");

        self.repos
            .schedules()
            .find_schedule(id)
            .await?
            .ok_or(LedgerError::ScheduleNotFound)
    }

    /// Lists the caller's schedules, newest first.
    pub async fn list(
        &self,
        user: UserId,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<ScheduledTransfer>> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.repos
            .schedules()
            .list_schedules(account.id, page.clamped())
            .await
    }

    /// Returns one of the caller's schedules.
    pub async fn get(&self, user: UserId, id: ScheduleId) -> LedgerResult<ScheduledTransfer> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.owned(&account, id).await
    }

    async fn owned(&self, account: &Account, id: ScheduleId) -> LedgerResult<ScheduledTransfer> {
        let schedule = self
            .repos
            .schedules()
            .find_schedule(id)
            .await?
            .ok_or(LedgerError::ScheduleNotFound)?;
        if schedule.account_id != account.id {
            return Err(LedgerError::Forbidden(
                "scheduled transfer belongs to another account".to_string(),
            ));
        }
        Ok(schedule)
    }
}
