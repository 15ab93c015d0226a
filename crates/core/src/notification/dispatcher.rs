//! Fire-and-forget notification dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use pocketbank_shared::types::{AccountId, Amount, NotificationId, TransactionId};
use tracing::{debug, info, warn};

use super::types::{Notification, NotificationType};
use crate::clock::Clock;
use crate::ledger::LedgerResult;
use crate::ports::{NotificationSink, Repositories};

/// Something an account owner should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Recipient account.
    pub account_id: AccountId,
    /// Kind of event.
    pub kind: NotificationType,
    /// Amount involved.
    pub amount: Option<Amount>,
    /// Related ledger row.
    pub related_transaction_id: Option<TransactionId>,
    /// Body text.
    pub content: String,
}

impl NotificationEvent {
    /// Builds an event about a ledger row.
    #[must_use]
    pub fn about(
        account_id: AccountId,
        kind: NotificationType,
        amount: Amount,
        transaction_id: Option<TransactionId>,
        content: String,
    ) -> Self {
        Self {
            account_id,
            kind,
            amount: Some(amount),
            related_transaction_id: transaction_id,
            content,
        }
    }
}

/// Persists notifications and hands them to the delivery sink.
///
/// Dispatch never fails the caller: the money movement already happened, so
/// storage and delivery errors are logged and dropped.
#[derive(Clone)]
pub struct NotificationDispatcher {
    repos: Arc<dyn Repositories>,
    sink: Arc<dyn NotificationSink>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher").finish_non_exhaustive()
    }
}

impl NotificationDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        repos: Arc<dyn Repositories>,
        sink: Arc<dyn NotificationSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { repos, sink, clock }
    }

    /// Stores the notification and schedules delivery in the background.
    pub async fn dispatch(&self, event: NotificationEvent) {
        let notification = Notification {
            id: NotificationId::new(),
            account_id: event.account_id,
            notification_type: event.kind,
            title: event.kind.title().to_string(),
            content: event.content,
            amount: event.amount,
            related_transaction_id: event.related_transaction_id,
            is_read: false,
            read_at: None,
            created_at: self.clock.now(),
        };

        if let Err(e) = self.repos.notifications().insert_notification(&notification).await {
            warn!(
                account_id = %notification.account_id,
                kind = %notification.notification_type,
                error = %e,
                "failed to store notification"
            );
            return;
        }
        debug!(notification_id = %notification.id, kind = %notification.notification_type, "notification stored");

        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            if let Err(e) = sink.deliver(&notification).await {
                warn!(notification_id = %notification.id, error = %e, "notification delivery failed");
            }
        });
    }

    /// Dispatches several events in order.
    pub async fn dispatch_all(&self, events: impl IntoIterator<Item = NotificationEvent>) {
        for event in events {
            self.dispatch(event).await;
        }
    }
}

/// Default sink: push delivery is an external collaborator, so this only
/// records that a notification would have been sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn deliver(&self, notification: &Notification) -> LedgerResult<()> {
        info!(
            notification_id = %notification.id,
            account_id = %notification.account_id,
            kind = %notification.notification_type,
            "notification ready for delivery"
        );
        Ok(())
    }
}
