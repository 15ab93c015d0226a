//! Integration tests for schedules, notifications, favorites and idempotency
//! records on SQLite.

mod common;

use chrono::Duration;
use pocketbank_core::LedgerError;
use pocketbank_core::auth::SimplePassword;
use pocketbank_core::clock::Clock;
use pocketbank_core::favorite::AddFavoriteRequest;
use pocketbank_core::guard::IdempotencyRecord;
use pocketbank_core::notification::NotificationType;
use pocketbank_core::ports::Repositories;
use pocketbank_core::schedule::{CreateScheduleRequest, ScheduleStatus};
use pocketbank_core::testing::TestBank;
use pocketbank_shared::types::{AccountNumber, Amount, PageRequest};
use rstest::rstest;
use serde_json::json;

use common::SqlBank;

fn schedule_to(bank: &SqlBank, to: &AccountNumber, amount: i64) -> CreateScheduleRequest {
    CreateScheduleRequest {
        to_account_number: to.clone(),
        amount: Amount::new(amount),
        simple_password: SimplePassword::new(TestBank::PIN),
        description: Some("allowance".to_string()),
        scheduled_at: bank.clock.now() + Duration::minutes(5),
    }
}

#[tokio::test]
async fn test_schedule_claim_is_single_winner() {
    let bank = SqlBank::new().await;
    let (alice, _) = bank.open_account("Alice", 10_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let created = bank
        .services
        .schedules
        .create(alice, schedule_to(&bank, &b.account_number, 1_000), None)
        .await
        .unwrap()
        .value;

    let schedules = bank.store.schedules();
    let now = bank.clock.now();
    assert!(schedules.claim(created.id, now).await.unwrap());
    assert!(!schedules.claim(created.id, now).await.unwrap());
    assert!(!schedules.cancel(created.id, created.account_id).await.unwrap());

    assert_eq!(schedules.release_stale_claims(now).await.unwrap(), 0);
    assert_eq!(
        schedules
            .release_stale_claims(now + Duration::minutes(10))
            .await
            .unwrap(),
        1
    );
    let reloaded = schedules.find_schedule(created.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, ScheduleStatus::Pending);
    assert_eq!(reloaded.claimed_at, None);
}

#[tokio::test]
async fn test_runner_executes_and_fails_schedules() {
    let bank = SqlBank::new().await;
    let (alice, a) = bank.open_account("Alice", 80_000).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let ok = bank
        .services
        .schedules
        .create(alice, schedule_to(&bank, &b.account_number, 30_000), None)
        .await
        .unwrap()
        .value;
    let too_big = bank
        .services
        .schedules
        .create(alice, schedule_to(&bank, &b.account_number, 100_000), None)
        .await
        .unwrap()
        .value;

    bank.clock.advance(Duration::minutes(5));
    let report = bank.services.runner.sweep().await.unwrap();
    assert_eq!(report.claimed, 2);
    assert_eq!(report.executed + report.failed, 2);

    let schedules = bank.store.schedules();
    let ok = schedules.find_schedule(ok.id).await.unwrap().unwrap();
    let too_big = schedules.find_schedule(too_big.id).await.unwrap().unwrap();
    assert_eq!(ok.status, ScheduleStatus::Executed);
    assert!(ok.transaction_id.is_some());
    assert_eq!(too_big.status, ScheduleStatus::Failed);
    assert_eq!(too_big.failure_reason.as_deref(), Some("INSUFFICIENT_FUNDS"));
    assert_eq!(bank.balance(a.id).await, 50_000);

    let unread = bank
        .store
        .notifications()
        .list_notifications(a.id, true, PageRequest::default())
        .await
        .unwrap();
    assert!(
        unread
            .content
            .iter()
            .any(|n| n.notification_type == NotificationType::ScheduledTransferFailed)
    );
}

#[tokio::test]
async fn test_notification_read_state() {
    let bank = SqlBank::new().await;
    let (alice, a) = bank.open_account("Alice", 10_000).await;
    let (bob, b) = bank.open_account("Bob", 0).await;
    bank.services
        .transfers
        .transfer(
            alice,
            pocketbank_core::transfer::TransferRequest {
                to_account_number: b.account_number.clone(),
                amount: Amount::new(1_000),
                simple_password: SimplePassword::new(TestBank::PIN),
                description: None,
            },
            None,
        )
        .await
        .unwrap();

    let notifications = bank.store.notifications();
    assert_eq!(notifications.count_unread(b.id).await.unwrap(), 1);
    let received = notifications
        .list_notifications(b.id, false, PageRequest::default())
        .await
        .unwrap()
        .content
        .remove(0);
    assert_eq!(received.notification_type, NotificationType::TransferReceived);

    let now = bank.clock.now();
    assert!(!notifications.mark_read(received.id, a.id, now).await.unwrap());
    assert!(notifications.mark_read(received.id, b.id, now).await.unwrap());
    assert_eq!(notifications.count_unread(b.id).await.unwrap(), 0);

    assert_eq!(bank.services.notifications.delete_read(bob).await.unwrap(), 1);
    assert_eq!(notifications.count_unread(a.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_favorite_conflicts() {
    let bank = SqlBank::new().await;
    let (alice, _) = bank.open_account("Alice", 0).await;
    let (_, b) = bank.open_account("Bob", 0).await;
    let request = || AddFavoriteRequest {
        account_number: b.account_number.clone(),
        nickname: "Bobby".to_string(),
        memo: None,
    };

    let favorite = bank.services.favorites.add(alice, request()).await.unwrap();
    assert_eq!(favorite.account_owner_name.as_deref(), Some("Bob"));
    assert!(matches!(
        bank.services.favorites.add(alice, request()).await,
        Err(LedgerError::Conflict(_))
    ));
}

#[rstest]
#[case::live_record_is_kept(Duration::hours(1), 1)]
#[case::expired_record_is_replaced(Duration::hours(25), 2)]
#[tokio::test]
async fn test_idempotency_record_replacement(#[case] later: Duration, #[case] expected_value: i64) {
    let bank = SqlBank::new().await;
    let repo = bank.store.idempotency();
    let now = bank.clock.now();
    let record = |value: i64, at| IdempotencyRecord {
        scope: "acct:transfer".to_string(),
        key: "k-1".to_string(),
        response: json!({ "value": value }),
        created_at: at,
        expires_at: at + Duration::hours(24),
    };

    repo.save_record(&record(1, now)).await.unwrap();
    repo.save_record(&record(2, now + later)).await.unwrap();

    let stored = repo
        .find_record("acct:transfer", "k-1", now + later)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.response, json!({ "value": expected_value }));
    assert_eq!(repo.purge_expired(now + Duration::days(3)).await.unwrap(), 1);
}
