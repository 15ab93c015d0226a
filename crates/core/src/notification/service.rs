//! Owner-facing notification queries and read state.

use std::sync::Arc;

use pocketbank_shared::types::{NotificationId, PageRequest, PageResponse, UserId};

use super::types::Notification;
use crate::account::require_account;
use crate::clock::Clock;
use crate::ledger::{LedgerError, LedgerResult};
use crate::ports::Repositories;

/// Notification inbox for the account owner.
pub struct NotificationService {
    repos: Arc<dyn Repositories>,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    /// Creates the service.
    #[must_use]
    pub fn new(repos: Arc<dyn Repositories>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Lists notifications, newest first.
    pub async fn list(
        &self,
        user: UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Notification>> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.repos
            .notifications()
            .list_notifications(account.id, unread_only, page.clamped())
            .await
    }

    /// Counts unread notifications.
    pub async fn unread_count(&self, user: UserId) -> LedgerResult<u64> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.repos.notifications().count_unread(account.id).await
    }

    /// Marks one notification read. Idempotent.
    pub async fn mark_read(&self, user: UserId, id: NotificationId) -> LedgerResult<()> {
        let account = require_account(self.repos.as_ref(), user).await?;
        if self
            .repos
            .notifications()
            .mark_read(id, account.id, self.clock.now())
            .await?
        {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("notification {id}")))
        }
    }

    /// Marks every notification read. Returns how many changed.
    pub async fn mark_all_read(&self, user: UserId) -> LedgerResult<u64> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.repos
            .notifications()
            .mark_all_read(account.id, self.clock.now())
            .await
    }

    /// Deletes one notification.
    pub async fn delete(&self, user: UserId, id: NotificationId) -> LedgerResult<()> {
        let account = require_account(self.repos.as_ref(), user).await?;
        if self
            .repos
            .notifications()
            .delete_notification(id, account.id)
            .await?
        {
            Ok(())
        } else {
            Err(LedgerError::NotFound(format!("notification {id}")))
        }
    }

    /// Deletes every read notification. Returns how many were removed.
    pub async fn delete_read(&self, user: UserId) -> LedgerResult<u64> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.repos.notifications().delete_read(account.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::{NotificationEvent, NotificationType};
    use crate::testing::TestBank;
    use pocketbank_shared::types::Amount;

    async fn seed(bank: &TestBank, account: pocketbank_shared::types::AccountId, n: usize) {
        for i in 0..n {
            bank.services
                .dispatcher
                .dispatch(NotificationEvent::about(
                    account,
                    NotificationType::DepositCompleted,
                    Amount::new(1_000),
                    None,
                    format!("deposit {i}"),
                ))
                .await;
        }
    }

    #[tokio::test]
    async fn test_read_state_is_tracked_server_side() {
        let bank = TestBank::new();
        let (user, account) = bank.open_account_without_pin("Kim").await;
        seed(&bank, account.id, 3).await;
        let service = &bank.services.notifications;

        assert_eq!(service.unread_count(user).await.unwrap(), 3);
        let page = service.list(user, false, PageRequest::default()).await.unwrap();
        assert_eq!(page.total_elements, 3);
        assert_eq!(page.content[0].content, "deposit 2");

        service.mark_read(user, page.content[0].id).await.unwrap();
        service.mark_read(user, page.content[0].id).await.unwrap();
        assert_eq!(service.unread_count(user).await.unwrap(), 2);
        let unread = service.list(user, true, PageRequest::default()).await.unwrap();
        assert_eq!(unread.total_elements, 2);
        assert!(unread.content.iter().all(|n| !n.is_read));

        assert_eq!(service.mark_all_read(user).await.unwrap(), 2);
        assert_eq!(service.unread_count(user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_read_keeps_unread() {
        let bank = TestBank::new();
        let (user, account) = bank.open_account_without_pin("Kim").await;
        seed(&bank, account.id, 2).await;
        let service = &bank.services.notifications;

        let page = service.list(user, false, PageRequest::default()).await.unwrap();
        service.mark_read(user, page.content[1].id).await.unwrap();

        assert_eq!(service.delete_read(user).await.unwrap(), 1);
        let rest = service.list(user, false, PageRequest::default()).await.unwrap();
        assert_eq!(rest.total_elements, 1);
        assert!(!rest.content[0].is_read);
    }

    #[tokio::test]
    async fn test_cannot_touch_someone_elses_notification() {
        let bank = TestBank::new();
        let (_, owner) = bank.open_account_without_pin("Kim").await;
        let (intruder, _) = bank.open_account_without_pin("Lee").await;
        seed(&bank, owner.id, 1).await;
        let id = bank.store.notifications_of(owner.id).await[0].id;

        let service = &bank.services.notifications;
        assert!(matches!(service.mark_read(intruder, id).await, Err(LedgerError::NotFound(_))));
        assert!(matches!(service.delete(intruder, id).await, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_paging_is_zero_indexed() {
        let bank = TestBank::new();
        let (user, account) = bank.open_account_without_pin("Kim").await;
        seed(&bank, account.id, 5).await;

        let second = bank
            .services
            .notifications
            .list(user, false, PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(second.number, 1);
        assert_eq!(second.total_pages, 3);
        assert_eq!(second.content.len(), 2);
        assert_eq!(second.content[0].content, "deposit 2");
    }
}
