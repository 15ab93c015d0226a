//! The transfer engine: every balance-changing operation goes through here.
//!
//! Each operation validates its input before touching any lock, verifies the
//! caller's simple password, then posts under the per-account locks. A
//! rejection observed under lock (insufficient funds, a locked account) is
//! recorded as a FAILED transaction and reported to every involved owner.
//! The FAILED row itself stays private to the originator.

use std::sync::Arc;

use pocketbank_shared::types::{AccountId, Amount, QrPaymentId, UserId};
use tracing::{info, instrument, warn};

use super::types::{
    DepositResult, QrCodeResult, QrGenerateRequest, QrPayRequest, QrPayResult, SelfDepositRequest,
    TransferRequest, TransferResult,
};
use crate::account::require_account;
use crate::auth::SimplePasswords;
use crate::clock::Clock;
use crate::guard::{AccountLocks, IdempotencyGuard, IdempotentResult};
use crate::ledger::validation::{
    MIN_SELF_DEPOSIT_AMOUNT, MIN_TRANSFER_AMOUNT, normalize_description, validate_amount,
};
use crate::ledger::{
    Account, LedgerError, LedgerResult, Transaction, TransactionStatus, TransactionType,
};
use crate::notification::{NotificationDispatcher, NotificationEvent, NotificationType};
use crate::ports::{DepositCommand, FailureRecord, Repositories, Settlement, TransferCommand};
use crate::qr::{QR_VALIDITY, QrPaymentIntent, QrStatus, generate_qr_code};
use crate::schedule::{ScheduleOutcome, ScheduledTransfer};

/// Result of a posting attempt made under lock.
#[derive(Debug)]
enum Posted {
    Completed(Transaction),
    Failed(LedgerError, Transaction),
}

/// Validates and executes money movements.
pub struct TransferEngine {
    repos: Arc<dyn Repositories>,
    locks: Arc<AccountLocks>,
    idempotency: Arc<IdempotencyGuard>,
    pins: Arc<SimplePasswords>,
    notifier: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    max_amount: Amount,
}

impl std::fmt::Debug for TransferEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferEngine")
            .field("max_amount", &self.max_amount)
            .finish_non_exhaustive()
    }
}

impl TransferEngine {
    /// Creates the engine. `max_amount` caps any single movement.
    #[must_use]
    pub fn new(
        repos: Arc<dyn Repositories>,
        locks: Arc<AccountLocks>,
        idempotency: Arc<IdempotencyGuard>,
        pins: Arc<SimplePasswords>,
        notifier: NotificationDispatcher,
        clock: Arc<dyn Clock>,
        max_amount: Amount,
    ) -> Self {
        Self {
            repos,
            locks,
            idempotency,
            pins,
            notifier,
            clock,
            max_amount,
        }
    }

    /// Sends money from the caller's account to another account.
    #[instrument(skip(self, request, key), fields(user = %user, amount = %request.amount), err)]
    pub async fn transfer(
        &self,
        user: UserId,
        request: TransferRequest,
        key: Option<&str>,
    ) -> LedgerResult<IdempotentResult<TransferResult>> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.idempotency
            .run(account.id, "transfer", key, || self.execute_transfer(account.clone(), request))
            .await
    }

    async fn execute_transfer(
        &self,
        sender: Account,
        request: TransferRequest,
    ) -> LedgerResult<TransferResult> {
        validate_amount(request.amount, MIN_TRANSFER_AMOUNT, self.max_amount)?;
        let description = normalize_description(request.description.as_deref())?;

        let recipient = self
            .repos
            .accounts()
            .find_by_number(&request.to_account_number)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(request.to_account_number.to_string()))?;
        if recipient.id == sender.id {
            return Err(LedgerError::validation(
                "cannot transfer to the same account",
            ));
        }

        self.pins
            .verify(&sender, request.simple_password.expose())
            .await?;

        let command = TransferCommand {
            tx_type: TransactionType::Transfer,
            from: sender.id,
            to: recipient.id,
            amount: request.amount,
            description,
            settlement: Settlement::None,
            now: self.clock.now(),
        };

        match self.post(&command).await? {
            Posted::Completed(tx) => {
                info!(transaction_id = %tx.id, "transfer completed");
                self.notifier
                    .dispatch_all([
                        NotificationEvent::about(
                            sender.id,
                            NotificationType::TransferSent,
                            tx.amount,
                            Some(tx.id),
                            format!("Sent {} won to {}", won(tx.amount), recipient.owner_name),
                        ),
                        NotificationEvent::about(
                            recipient.id,
                            NotificationType::TransferReceived,
                            tx.amount,
                            Some(tx.id),
                            format!("Received {} won from {}", won(tx.amount), sender.owner_name),
                        ),
                    ])
                    .await;
                Ok(TransferResult {
                    transaction_id: tx.id,
                    from_account: tx.from_account_number,
                    to_account: recipient.account_number,
                    to_account_owner: recipient.owner_name,
                    amount: tx.amount,
                    description: tx.description,
                    status: tx.status,
                    created_at: tx.created_at,
                    balance_after: tx.balance_after,
                })
            }
            Posted::Failed(error, tx) => {
                self.notifier
                    .dispatch_all([
                        NotificationEvent::about(
                            sender.id,
                            NotificationType::TransferFailed,
                            tx.amount,
                            Some(tx.id),
                            format!(
                                "Transfer of {} won to {} failed: {error}",
                                won(tx.amount),
                                recipient.owner_name
                            ),
                        ),
                        incoming_failed(recipient.id, tx.amount, &sender.owner_name),
                    ])
                    .await;
                Err(error)
            }
        }
    }

    /// Credits the caller's own account.
    #[instrument(skip(self, request, key), fields(user = %user, amount = %request.amount), err)]
    pub async fn self_deposit(
        &self,
        user: UserId,
        request: SelfDepositRequest,
        key: Option<&str>,
    ) -> LedgerResult<IdempotentResult<DepositResult>> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.idempotency
            .run(account.id, "self-deposit", key, || {
                self.execute_self_deposit(account.clone(), request)
            })
            .await
    }

    async fn execute_self_deposit(
        &self,
        account: Account,
        request: SelfDepositRequest,
    ) -> LedgerResult<DepositResult> {
        validate_amount(request.amount, MIN_SELF_DEPOSIT_AMOUNT, self.max_amount)?;
        let description = normalize_description(request.description.as_deref())?;
        self.pins
            .verify(&account, request.simple_password.expose())
            .await?;

        let command = DepositCommand {
            tx_type: TransactionType::SelfDeposit,
            account: account.id,
            amount: request.amount,
            description,
            now: self.clock.now(),
        };

        let posted = {
            let _guard = self.locks.acquire(&[account.id]).await?;
            match self.repos.ledger().apply_deposit(&command).await {
                Ok(tx) => Posted::Completed(tx),
                Err(error) if error.is_recorded_failure() => {
                    let tx = self
                        .repos
                        .ledger()
                        .record_failure(&FailureRecord {
                            tx_type: command.tx_type,
                            from: account.id,
                            to: None,
                            amount: command.amount,
                            description: command.description.clone(),
                            reason: error.error_code().to_string(),
                            settlement: Settlement::None,
                            now: command.now,
                        })
                        .await?;
                    Posted::Failed(error, tx)
                }
                Err(error) => return Err(error),
            }
        };

        match posted {
            Posted::Completed(tx) => {
                info!(transaction_id = %tx.id, "self-deposit completed");
                self.notifier
                    .dispatch(NotificationEvent::about(
                        account.id,
                        NotificationType::DepositCompleted,
                        tx.amount,
                        Some(tx.id),
                        format!("Deposited {} won", won(tx.amount)),
                    ))
                    .await;
                Ok(DepositResult {
                    transaction_id: tx.id,
                    account_number: tx.from_account_number,
                    amount: tx.amount,
                    balance_after: tx.balance_after,
                    description: tx.description,
                    deposited_at: tx.created_at,
                })
            }
            Posted::Failed(error, tx) => {
                warn!(transaction_id = %tx.id, reason = error.error_code(), "self-deposit recorded as failed");
                self.notifier
                    .dispatch(NotificationEvent::about(
                        account.id,
                        NotificationType::DepositFailed,
                        tx.amount,
                        Some(tx.id),
                        format!("Deposit of {} won failed: {error}", won(tx.amount)),
                    ))
                    .await;
                Err(error)
            }
        }
    }

    /// Creates a PENDING QR intent payable to the caller for ten minutes.
    #[instrument(skip(self, request, key), fields(user = %user, amount = %request.amount), err)]
    pub async fn generate_qr(
        &self,
        user: UserId,
        request: QrGenerateRequest,
        key: Option<&str>,
    ) -> LedgerResult<IdempotentResult<QrCodeResult>> {
        let seller = require_account(self.repos.as_ref(), user).await?;
        self.idempotency
            .run(seller.id, "qr-generate", key, || self.execute_generate_qr(seller.clone(), request))
            .await
    }

    async fn execute_generate_qr(
        &self,
        seller: Account,
        request: QrGenerateRequest,
    ) -> LedgerResult<QrCodeResult> {
        validate_amount(request.amount, MIN_TRANSFER_AMOUNT, self.max_amount)?;
        let description = normalize_description(request.description.as_deref())?;
        if !seller.is_active() {
            return Err(LedgerError::AccountLocked);
        }

        let now = self.clock.now();
        let intent = QrPaymentIntent {
            id: QrPaymentId::new(),
            code: generate_qr_code(now),
            seller_account_id: seller.id,
            seller_account_number: seller.account_number,
            seller_name: seller.owner_name,
            amount: request.amount,
            description,
            status: QrStatus::Pending,
            expires_at: now + QR_VALIDITY,
            created_at: now,
            paid_at: None,
            buyer_account_id: None,
            transaction_id: None,
        };
        self.repos.qr_payments().insert_intent(&intent).await?;
        info!(qr_payment_id = %intent.id, "QR intent generated");

        Ok(QrCodeResult {
            qr_payment_id: intent.id,
            qr_code: intent.code,
            amount: intent.amount,
            description: intent.description,
            status: intent.status,
            expires_at: intent.expires_at,
            created_at: intent.created_at,
        })
    }

    /// Pays a QR intent from the caller's account.
    ///
    /// Marking the intent PAID and moving the money happen in one unit, so
    /// an intent is paid at most once.
    #[instrument(skip(self, request, key), fields(user = %user), err)]
    pub async fn pay_qr(
        &self,
        user: UserId,
        request: QrPayRequest,
        key: Option<&str>,
    ) -> LedgerResult<IdempotentResult<QrPayResult>> {
        let buyer = require_account(self.repos.as_ref(), user).await?;
        self.idempotency
            .run(buyer.id, "qr-pay", key, || self.execute_pay_qr(buyer.clone(), request))
            .await
    }

    async fn execute_pay_qr(&self, buyer: Account, request: QrPayRequest) -> LedgerResult<QrPayResult> {
        let code = request.qr_code.trim();
        if code.is_empty() {
            return Err(LedgerError::validation("qrCode is required"));
        }
        let intent = self
            .repos
            .qr_payments()
            .find_by_code(code)
            .await?
            .ok_or(LedgerError::QrNotFound)?;

        if let Err(error) = intent.ensure_payable(self.clock.now()) {
            if error == LedgerError::QrExpired {
                self.expire(intent.id).await;
            }
            return Err(error);
        }
        if intent.seller_account_id == buyer.id {
            return Err(LedgerError::validation("cannot pay your own QR code"));
        }

        self.pins
            .verify(&buyer, request.simple_password.expose())
            .await?;

        let command = TransferCommand {
            tx_type: TransactionType::QrPayment,
            from: buyer.id,
            to: intent.seller_account_id,
            amount: intent.amount,
            description: intent.description.clone(),
            settlement: Settlement::Qr(intent.id),
            now: self.clock.now(),
        };

        let posted = match self.post(&command).await {
            Ok(posted) => posted,
            Err(LedgerError::QrExpired) => {
                self.expire(intent.id).await;
                return Err(LedgerError::QrExpired);
            }
            Err(error) => return Err(error),
        };

        match posted {
            Posted::Completed(tx) => {
                info!(transaction_id = %tx.id, qr_payment_id = %intent.id, "QR payment completed");
                self.notifier
                    .dispatch_all([
                        NotificationEvent::about(
                            buyer.id,
                            NotificationType::QrPaymentSent,
                            tx.amount,
                            Some(tx.id),
                            format!("Paid {} won to {}", won(tx.amount), intent.seller_name),
                        ),
                        NotificationEvent::about(
                            intent.seller_account_id,
                            NotificationType::QrPaymentReceived,
                            tx.amount,
                            Some(tx.id),
                            format!("Received {} won from {}", won(tx.amount), buyer.owner_name),
                        ),
                    ])
                    .await;
                Ok(QrPayResult {
                    qr_payment_id: intent.id,
                    transaction_id: tx.id,
                    buyer_account: tx.from_account_number,
                    seller_account: intent.seller_account_number,
                    seller_name: intent.seller_name,
                    amount: tx.amount,
                    description: tx.description,
                    status: QrStatus::Paid,
                    paid_at: tx.created_at,
                    balance_after: tx.balance_after,
                })
            }
            Posted::Failed(error, tx) => {
                self.notifier
                    .dispatch_all([
                        NotificationEvent::about(
                            buyer.id,
                            NotificationType::QrPaymentFailed,
                            tx.amount,
                            Some(tx.id),
                            format!(
                                "QR payment of {} won to {} failed: {error}",
                                won(tx.amount),
                                intent.seller_name
                            ),
                        ),
                        incoming_failed(intent.seller_account_id, tx.amount, &buyer.owner_name),
                    ])
                    .await;
                Err(error)
            }
        }
    }

    /// Executes a schedule the caller has already claimed.
    ///
    /// Returns `Err` only for errors after which the claim should be given
    /// back (retryable or storage errors, or a lost claim). Every other
    /// failure leaves the schedule FAILED and is reported as
    /// [`ScheduleOutcome::Failed`].
    #[instrument(skip(self, schedule), fields(schedule_id = %schedule.id), err)]
    pub async fn execute_scheduled(&self, schedule: &ScheduledTransfer) -> LedgerResult<ScheduleOutcome> {
        let Some(owner) = self.repos.accounts().find_account(schedule.account_id).await? else {
            return self
                .fail_schedule(schedule, None, LedgerError::AccountNotFound(schedule.account_id.to_string()))
                .await;
        };
        if !owner.is_active() || owner.credential_version != schedule.credential_version {
            return self
                .fail_schedule(schedule, Some(&owner), LedgerError::CredentialChanged)
                .await;
        }
        let Some(recipient) = self
            .repos
            .accounts()
            .find_by_number(&schedule.to_account_number)
            .await?
        else {
            return self
                .fail_schedule(
                    schedule,
                    Some(&owner),
                    LedgerError::AccountNotFound(schedule.to_account_number.to_string()),
                )
                .await;
        };

        let command = TransferCommand {
            tx_type: TransactionType::ScheduledTransfer,
            from: owner.id,
            to: recipient.id,
            amount: schedule.amount,
            description: schedule.description.clone(),
            settlement: Settlement::Schedule(schedule.id),
            now: self.clock.now(),
        };

        match self.post(&command).await {
            Ok(Posted::Completed(tx)) => {
                info!(transaction_id = %tx.id, "scheduled transfer executed");
                self.notifier
                    .dispatch_all([
                        NotificationEvent::about(
                            owner.id,
                            NotificationType::ScheduledTransferExecuted,
                            tx.amount,
                            Some(tx.id),
                            format!(
                                "Scheduled transfer of {} won to {} was sent",
                                won(tx.amount),
                                recipient.owner_name
                            ),
                        ),
                        NotificationEvent::about(
                            recipient.id,
                            NotificationType::TransferReceived,
                            tx.amount,
                            Some(tx.id),
                            format!("Received {} won from {}", won(tx.amount), owner.owner_name),
                        ),
                    ])
                    .await;
                Ok(ScheduleOutcome::Executed(tx))
            }
            Ok(Posted::Failed(error, tx)) => {
                warn!(transaction_id = %tx.id, reason = error.error_code(), "scheduled transfer failed");
                self.notify_schedule_failed(schedule, owner.id, Some(&tx), &error).await;
                self.notifier
                    .dispatch(incoming_failed(recipient.id, tx.amount, &owner.owner_name))
                    .await;
                Ok(ScheduleOutcome::Failed(error))
            }
            Err(error) if keeps_claim(&error) => Err(error),
            Err(error) => self.fail_schedule(schedule, Some(&owner), error).await,
        }
    }

    /// Marks a claimed schedule FAILED without a ledger row and notifies.
    async fn fail_schedule(
        &self,
        schedule: &ScheduledTransfer,
        owner: Option<&Account>,
        error: LedgerError,
    ) -> LedgerResult<ScheduleOutcome> {
        let flipped = self
            .repos
            .schedules()
            .mark_failed(schedule.id, error.error_code(), self.clock.now())
            .await?;
        if !flipped {
            return Err(LedgerError::ScheduleNotPending);
        }
        warn!(schedule_id = %schedule.id, reason = error.error_code(), "scheduled transfer failed before posting");
        if let Some(owner) = owner {
            self.notify_schedule_failed(schedule, owner.id, None, &error).await;
        }
        Ok(ScheduleOutcome::Failed(error))
    }

    async fn notify_schedule_failed(
        &self,
        schedule: &ScheduledTransfer,
        owner: AccountId,
        tx: Option<&Transaction>,
        error: &LedgerError,
    ) {
        self.notifier
            .dispatch(NotificationEvent::about(
                owner,
                NotificationType::ScheduledTransferFailed,
                schedule.amount,
                tx.map(|t| t.id),
                format!(
                    "Scheduled transfer of {} won to {} failed: {error}",
                    won(schedule.amount),
                    schedule.to_account_number
                ),
            ))
            .await;
    }

    /// Posts a two-account movement under both account locks.
    ///
    /// Rejections the ledger observes under lock are appended as FAILED rows
    /// while the locks are still held.
    async fn post(&self, command: &TransferCommand) -> LedgerResult<Posted> {
        let _guard = self.locks.acquire(&[command.from, command.to]).await?;
        match self.repos.ledger().apply_transfer(command).await {
            Ok(tx) => {
                debug_assert_eq!(tx.status, TransactionStatus::Completed);
                Ok(Posted::Completed(tx))
            }
            Err(error) if error.is_recorded_failure() => {
                let tx = self
                    .repos
                    .ledger()
                    .record_failure(&FailureRecord {
                        tx_type: command.tx_type,
                        from: command.from,
                        to: Some(command.to),
                        amount: command.amount,
                        description: command.description.clone(),
                        reason: error.error_code().to_string(),
                        settlement: command.settlement,
                        now: command.now,
                    })
                    .await?;
                Ok(Posted::Failed(error, tx))
            }
            Err(error) => Err(error),
        }
    }

    async fn expire(&self, id: QrPaymentId) {
        match self.repos.qr_payments().expire_intent(id, self.clock.now()).await {
            Ok(true) => info!(qr_payment_id = %id, "QR intent expired"),
            Ok(false) => {}
            Err(e) => warn!(qr_payment_id = %id, error = %e, "failed to expire QR intent"),
        }
    }
}

/// Errors after which a schedule claim is released rather than failed.
const fn keeps_claim(error: &LedgerError) -> bool {
    error.is_retryable()
        || matches!(
            error,
            LedgerError::Storage(_) | LedgerError::ScheduleNotPending
        )
}

/// Tells the receiving side that money addressed to it did not arrive.
///
/// Carries no transaction id: the FAILED row belongs to the sender.
fn incoming_failed(recipient: AccountId, amount: Amount, sender_name: &str) -> NotificationEvent {
    NotificationEvent::about(
        recipient,
        NotificationType::IncomingTransferFailed,
        amount,
        None,
        format!("{} won from {sender_name} did not go through", won(amount)),
    )
}

/// Formats an amount with thousands separators.
pub(crate) fn won(amount: Amount) -> String {
    let digits = amount.value().unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount.is_negative() {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
