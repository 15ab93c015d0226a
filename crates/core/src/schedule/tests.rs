//! Scheduler scenarios.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use pocketbank_shared::types::{AccountNumber, Amount, PageRequest, UserId};

use super::*;
use crate::auth::SimplePassword;
use crate::clock::Clock;
use crate::ledger::{LedgerError, TransactionStatus, TransactionType};
use crate::notification::NotificationType;
use crate::ports::Repositories;
use crate::testing::TestBank;

fn request(bank: &TestBank, to: &AccountNumber, amount: i64) -> CreateScheduleRequest {
    CreateScheduleRequest {
        to_account_number: to.clone(),
        amount: Amount::new(amount),
        simple_password: SimplePassword::new(TestBank::PIN),
        description: Some("rent".to_string()),
        scheduled_at: bank.clock.now() + Duration::minutes(5),
    }
}

async fn schedule(bank: &TestBank, user: UserId, to: &AccountNumber, amount: i64) -> ScheduledTransfer {
    bank.services
        .schedules
        .create(user, request(bank, to, amount), None)
        .await
        .unwrap()
        .value
}

async fn status_of(bank: &TestBank, schedule: &ScheduledTransfer) -> ScheduledTransfer {
    bank.store
        .schedules()
        .find_schedule(schedule.id)
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn test_create_validates_window_amount_and_pin() {
    let bank = TestBank::new();
    let (alice, _) = bank.open_account("Alice", 0).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let service = &bank.services.schedules;

    let mut too_soon = request(&bank, &b.account_number, 1_000);
    too_soon.scheduled_at = bank.clock.now() + Duration::seconds(30);
    assert!(matches!(service.create(alice, too_soon, None).await, Err(LedgerError::Validation(_))));

    let mut too_late = request(&bank, &b.account_number, 1_000);
    too_late.scheduled_at = bank.clock.now() + Duration::days(366);
    assert!(matches!(service.create(alice, too_late, None).await, Err(LedgerError::Validation(_))));

    let too_big = request(&bank, &b.account_number, 1_000_001);
    assert!(matches!(service.create(alice, too_big, None).await, Err(LedgerError::Validation(_))));

    let mut wrong_pin = request(&bank, &b.account_number, 1_000);
    wrong_pin.simple_password = SimplePassword::new("999999");
    assert!(matches!(
        service.create(alice, wrong_pin, None).await,
        Err(LedgerError::SimplePasswordMismatch { .. })
    ));

    let created = service
        .create(alice, request(&bank, &b.account_number, 1_000_000), None)
        .await
        .unwrap()
        .value;
    assert_eq!(created.status, ScheduleStatus::Pending);
    let listed = service.list(alice, PageRequest::default()).await.unwrap();
    assert_eq!(listed.content, vec![created]);
}

#[tokio::test]
async fn test_sweep_executes_due_schedule() {
    let bank = TestBank::new();
    let (alice, a) = bank.open_account("Alice", 100_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let created = schedule(&bank, alice, &b.account_number, 30_000).await;

    let early = bank.services.runner.sweep().await.unwrap();
    assert_eq!(early.due, 0);
    assert_eq!(bank.balance(a.id).await, 100_000);

    bank.clock.advance(Duration::minutes(5));
    let report = bank.services.runner.sweep().await.unwrap();
    assert_eq!(report.executed, 1);

    let done = status_of(&bank, &created).await;
    assert_eq!(done.status, ScheduleStatus::Executed);
    assert!(done.executed_at.is_some());
    assert_eq!(bank.balance(a.id).await, 70_000);
    assert_eq!(bank.balance(b.id).await, 30_000);

    let tx = bank
        .store
        .ledger()
        .find_transaction(done.transaction_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.tx_type, TransactionType::ScheduledTransfer);
    assert_eq!(tx.schedule_id, Some(created.id));
    assert_eq!(
        bank.store.notifications_of(a.id).await[0].notification_type,
        NotificationType::ScheduledTransferExecuted
    );

    let again = bank.services.runner.sweep().await.unwrap();
    assert_eq!(again.due, 0);
}

#[tokio::test]
async fn test_scheduled_overdraft_fails_with_notification() {
    let bank = TestBank::new();
    let (alice, a) = bank.open_account("Alice", 80_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let created = schedule(&bank, alice, &b.account_number, 100_000).await;

    bank.clock.advance(Duration::minutes(6));
    let report = bank.services.runner.sweep().await.unwrap();
    assert_eq!(report.failed, 1);

    let failed = status_of(&bank, &created).await;
    assert_eq!(failed.status, ScheduleStatus::Failed);
    assert_eq!(failed.failure_reason.as_deref(), Some("INSUFFICIENT_FUNDS"));
    assert_eq!(bank.balance(a.id).await, 80_000);

    let notices = bank.store.notifications_of(a.id).await;
    assert_eq!(notices[0].notification_type, NotificationType::ScheduledTransferFailed);
    assert_eq!(notices[0].related_transaction_id, failed.transaction_id);
    let incoming = bank.store.notifications_of(b.id).await;
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].notification_type, NotificationType::IncomingTransferFailed);

    let row = bank.store.all_transactions().await.pop().unwrap();
    assert_eq!(row.status, TransactionStatus::Failed);
    assert_eq!(row.tx_type, TransactionType::ScheduledTransfer);
}

#[tokio::test]
async fn test_pin_change_invalidates_pending_schedules() {
    let bank = TestBank::new();
    let (alice, a) = bank.open_account("Alice", 50_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let created = schedule(&bank, alice, &b.account_number, 10_000).await;
    let rows_before = bank.store.all_transactions().await.len();

    bank.services
        .accounts
        .change_simple_password(alice, TestBank::PIN, "246802", "246802")
        .await
        .unwrap();

    bank.clock.advance(Duration::minutes(5));
    bank.services.runner.sweep().await.unwrap();

    let failed = status_of(&bank, &created).await;
    assert_eq!(failed.status, ScheduleStatus::Failed);
    assert_eq!(failed.failure_reason.as_deref(), Some("CREDENTIAL_CHANGED"));
    assert_eq!(bank.balance(a.id).await, 50_000);
    assert_eq!(bank.store.all_transactions().await.len(), rows_before);
    assert_eq!(
        bank.store.notifications_of(a.id).await[0].notification_type,
        NotificationType::ScheduledTransferFailed
    );
}

#[tokio::test]
async fn test_cancel_rules() {
    let bank = TestBank::new();
    let (alice, _) = bank.open_account("Alice", 50_000).await;
    let (bob, b) = bank.open_account("Bob", 0).await;
    let service = &bank.services.schedules;

    let first = schedule(&bank, alice, &b.account_number, 1_000).await;
    assert!(matches!(service.cancel(bob, first.id).await, Err(LedgerError::Forbidden(_))));
    assert!(matches!(service.get(bob, first.id).await, Err(LedgerError::Forbidden(_))));

    let cancelled = service.cancel(alice, first.id).await.unwrap();
    assert_eq!(cancelled.status, ScheduleStatus::Cancelled);
    assert_eq!(service.cancel(alice, first.id).await.unwrap_err(), LedgerError::ScheduleNotPending);

    let second = schedule(&bank, alice, &b.account_number, 1_000).await;
    bank.clock.advance(Duration::minutes(5));
    bank.services.runner.sweep().await.unwrap();
    assert_eq!(service.cancel(alice, second.id).await.unwrap_err(), LedgerError::ScheduleNotPending);
    assert_eq!(service.get(alice, second.id).await.unwrap().status, ScheduleStatus::Executed);
}

#[tokio::test]
async fn test_stale_claim_is_recovered() {
    let bank = TestBank::new();
    let (alice, a) = bank.open_account("Alice", 50_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let created = schedule(&bank, alice, &b.account_number, 5_000).await;

    bank.clock.advance(Duration::minutes(5));
    // A worker claims and dies before executing.
    assert!(bank.store.schedules().claim(created.id, bank.clock.now()).await.unwrap());
    let blocked = bank.services.runner.sweep().await.unwrap();
    assert_eq!(blocked.due, 0);

    bank.clock.advance(Duration::minutes(6));
    let report = bank.services.runner.sweep().await.unwrap();
    assert_eq!(report.recovered, 1);
    assert_eq!(report.executed, 1);
    assert_eq!(bank.balance(a.id).await, 45_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_runners_execute_each_schedule_once() {
    let bank = Arc::new(TestBank::new());
    let (alice, a) = bank.open_account("Alice", 1_000_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    for _ in 0..10 {
        schedule(&bank, alice, &b.account_number, 1_000).await;
    }
    bank.clock.advance(Duration::minutes(5));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let runner = ScheduleRunner::new(
                bank.store.clone(),
                Arc::clone(&bank.services.transfers),
                bank.clock.clone(),
                50,
                StdDuration::from_secs(300),
            );
            tokio::spawn(async move { runner.sweep().await.unwrap() })
        })
        .collect();

    let mut executed = 0;
    for handle in handles {
        executed += handle.await.unwrap().executed;
    }
    assert_eq!(executed, 10);

    let postings = bank
        .store
        .all_transactions()
        .await
        .into_iter()
        .filter(|t| t.tx_type == TransactionType::ScheduledTransfer)
        .count();
    assert_eq!(postings, 10);
    assert_eq!(bank.balance(a.id).await, 990_000);
    assert_eq!(bank.balance(b.id).await, 10_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_and_execute_race_has_one_winner() {
    for _ in 0..20 {
        let bank = Arc::new(TestBank::new());
        let (alice, a) = bank.open_account("Alice", 50_000).await;
        let (_, b) = bank.open_account("Bob", 0).await;
        let created = schedule(&bank, alice, &b.account_number, 7_000).await;
        bank.clock.advance(Duration::minutes(5));

        let canceller = {
            let bank = Arc::clone(&bank);
            tokio::spawn(async move { bank.services.schedules.cancel(alice, created.id).await })
        };
        let sweeper = {
            let bank = Arc::clone(&bank);
            tokio::spawn(async move { bank.services.runner.sweep().await })
        };
        let cancelled = canceller.await.unwrap();
        sweeper.await.unwrap().unwrap();

        let final_state = status_of(&bank, &created).await;
        let postings = bank
            .store
            .all_transactions()
            .await
            .into_iter()
            .filter(|t| t.schedule_id == Some(created.id))
            .count();

        match final_state.status {
            ScheduleStatus::Cancelled => {
                assert!(cancelled.is_ok());
                assert_eq!(postings, 0);
                assert_eq!(bank.balance(a.id).await, 50_000);
            }
            ScheduleStatus::Executed => {
                assert_eq!(cancelled.unwrap_err(), LedgerError::ScheduleNotPending);
                assert_eq!(postings, 1);
                assert_eq!(bank.balance(a.id).await, 43_000);
            }
            other => panic!("unexpected final state {other}"),
        }
    }
}

#[tokio::test]
async fn test_runner_stops_on_shutdown() {
    let bank = TestBank::new();
    let (tx, rx) = tokio::sync::watch::channel(false);
    let runner = Arc::clone(&bank.services.runner);
    let handle = tokio::spawn(async move { runner.run(StdDuration::from_millis(10), rx).await });

    tokio::time::sleep(StdDuration::from_millis(30)).await;
    tx.send(true).unwrap();
    tokio::time::timeout(StdDuration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_runner_waits_for_next_tick_when_claims_are_released() {
    let bank = TestBank::new();
    let (alice, _) = bank.open_account("Alice", 50_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let created = schedule(&bank, alice, &b.account_number, 10_000).await;
    bank.clock.advance(Duration::minutes(6));
    bank.faults
        .fail_postings_with(Some(LedgerError::Storage("disk full".to_string())));

    let runner = Arc::new(ScheduleRunner::new(
        bank.faults.clone(),
        Arc::clone(&bank.services.transfers),
        bank.clock.clone(),
        1,
        StdDuration::from_secs(300),
    ));
    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move { runner.run(StdDuration::from_secs(3_600), rx).await })
    };

    tokio::time::sleep(StdDuration::from_millis(100)).await;
    tx.send(true).unwrap();
    tokio::time::timeout(StdDuration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(bank.faults.posting_attempts(), 1);
    assert_eq!(status_of(&bank, &created).await.status, ScheduleStatus::Pending);
}
