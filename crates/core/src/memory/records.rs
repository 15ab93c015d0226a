//! QR intents, schedules, notifications, favorites and idempotency records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pocketbank_shared::types::{
    AccountId, FavoriteId, NotificationId, PageRequest, PageResponse, QrPaymentId, ScheduleId,
};

use super::{MemoryStore, newest_first, paginate};
use crate::favorite::Favorite;
use crate::guard::IdempotencyRecord;
use crate::ledger::{LedgerError, LedgerResult};
use crate::notification::Notification;
use crate::ports::{
    FavoriteRepository, IdempotencyRepository, NotificationRepository, QrPaymentRepository,
    ScheduleRepository,
};
use crate::qr::{QrPaymentIntent, QrStatus};
use crate::schedule::{ScheduleStatus, ScheduledTransfer};

#[async_trait]
impl QrPaymentRepository for MemoryStore {
    async fn insert_intent(&self, intent: &QrPaymentIntent) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        if state.qr_payments.values().any(|q| q.code == intent.code) {
            return Err(LedgerError::Conflict("QR code already exists".to_string()));
        }
        state.qr_payments.insert(intent.id, intent.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> LedgerResult<Option<QrPaymentIntent>> {
        let state = self.state.lock().await;
        Ok(state.qr_payments.values().find(|q| q.code == code).cloned())
    }

    async fn find_intent(&self, id: QrPaymentId) -> LedgerResult<Option<QrPaymentIntent>> {
        Ok(self.state.lock().await.qr_payments.get(&id).cloned())
    }

    async fn expire_intent(&self, id: QrPaymentId, now: DateTime<Utc>) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        match state.qr_payments.get_mut(&id) {
            Some(intent) if intent.status == QrStatus::Pending && intent.is_expired_at(now) => {
                intent.status = QrStatus::Expired;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl ScheduleRepository for MemoryStore {
    async fn insert_schedule(&self, schedule: &ScheduledTransfer) -> LedgerResult<()> {
        self.state.lock().await.schedules.push(schedule.clone());
        Ok(())
    }

    async fn find_schedule(&self, id: ScheduleId) -> LedgerResult<Option<ScheduledTransfer>> {
        let state = self.state.lock().await;
        Ok(state.schedules.iter().find(|s| s.id == id).cloned())
    }

    async fn list_schedules(
        &self,
        account: AccountId,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<ScheduledTransfer>> {
        let state = self.state.lock().await;
        let rows = state
            .schedules
            .iter()
            .filter(|s| s.account_id == account)
            .cloned()
            .collect();
        Ok(paginate(newest_first(rows, |s| s.created_at), page))
    }

    async fn find_due(&self, now: DateTime<Utc>, limit: u64) -> LedgerResult<Vec<ScheduledTransfer>> {
        let state = self.state.lock().await;
        let mut due: Vec<ScheduledTransfer> = state
            .schedules
            .iter()
            .filter(|s| s.status == ScheduleStatus::Pending && s.scheduled_at <= now)
            .cloned()
            .collect();
        due.sort_by_key(|s| s.scheduled_at);
        due.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(due)
    }

    async fn claim(&self, id: ScheduleId, now: DateTime<Utc>) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        match state.schedules.iter_mut().find(|s| s.id == id) {
            Some(s) if s.status == ScheduleStatus::Pending => {
                s.status = ScheduleStatus::Executing;
                s.claimed_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_claim(&self, id: ScheduleId) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        match state.schedules.iter_mut().find(|s| s.id == id) {
            Some(s) if s.status == ScheduleStatus::Executing => {
                s.status = ScheduleStatus::Pending;
                s.claimed_at = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn cancel(&self, id: ScheduleId, owner: AccountId) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        match state.schedules.iter_mut().find(|s| s.id == id) {
            Some(s) if s.account_id == owner && s.status == ScheduleStatus::Pending => {
                s.status = ScheduleStatus::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_failed(&self, id: ScheduleId, reason: &str, now: DateTime<Utc>) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        match state.schedules.iter_mut().find(|s| s.id == id) {
            Some(s) if s.status == ScheduleStatus::Executing => {
                s.status = ScheduleStatus::Failed;
                s.failure_reason = Some(reason.to_string());
                s.executed_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release_stale_claims(&self, claimed_before: DateTime<Utc>) -> LedgerResult<u64> {
        let mut state = self.state.lock().await;
        let mut released = 0;
        for s in state.schedules.iter_mut().filter(|s| {
            s.status == ScheduleStatus::Executing && s.claimed_at.is_none_or(|at| at < claimed_before)
        }) {
            s.status = ScheduleStatus::Pending;
            s.claimed_at = None;
            released += 1;
        }
        Ok(released)
    }
}

#[async_trait]
impl NotificationRepository for MemoryStore {
    async fn insert_notification(&self, notification: &Notification) -> LedgerResult<()> {
        self.state.lock().await.notifications.push(notification.clone());
        Ok(())
    }

    async fn find_notification(&self, id: NotificationId) -> LedgerResult<Option<Notification>> {
        let state = self.state.lock().await;
        Ok(state.notifications.iter().find(|n| n.id == id).cloned())
    }

    async fn list_notifications(
        &self,
        account: AccountId,
        unread_only: bool,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<Notification>> {
        let state = self.state.lock().await;
        let rows = state
            .notifications
            .iter()
            .filter(|n| n.account_id == account && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        Ok(paginate(newest_first(rows, |n| n.created_at), page))
    }

    async fn count_unread(&self, account: AccountId) -> LedgerResult<u64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.account_id == account && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, id: NotificationId, account: AccountId, now: DateTime<Utc>) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        let Some(n) = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.account_id == account)
        else {
            return Ok(false);
        };
        if !n.is_read {
            n.is_read = true;
            n.read_at = Some(now);
        }
        Ok(true)
    }

    async fn mark_all_read(&self, account: AccountId, now: DateTime<Utc>) -> LedgerResult<u64> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for n in state
            .notifications
            .iter_mut()
            .filter(|n| n.account_id == account && !n.is_read)
        {
            n.is_read = true;
            n.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_notification(&self, id: NotificationId, account: AccountId) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.id == id && n.account_id == account));
        Ok(state.notifications.len() < before)
    }

    async fn delete_read(&self, account: AccountId) -> LedgerResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.notifications.len();
        state
            .notifications
            .retain(|n| !(n.account_id == account && n.is_read));
        Ok((before - state.notifications.len()) as u64)
    }
}

#[async_trait]
impl FavoriteRepository for MemoryStore {
    async fn insert_favorite(&self, favorite: &Favorite) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        if state.favorites.iter().any(|f| {
            f.account_id == favorite.account_id && f.account_number == favorite.account_number
        }) {
            return Err(LedgerError::Conflict(
                "account is already a favorite".to_string(),
            ));
        }
        state.favorites.push(favorite.clone());
        Ok(())
    }

    async fn find_favorite(&self, id: FavoriteId) -> LedgerResult<Option<Favorite>> {
        let state = self.state.lock().await;
        Ok(state.favorites.iter().find(|f| f.id == id).cloned())
    }

    async fn list_favorites(&self, account: AccountId) -> LedgerResult<Vec<Favorite>> {
        let state = self.state.lock().await;
        let rows = state
            .favorites
            .iter()
            .filter(|f| f.account_id == account)
            .cloned()
            .collect();
        Ok(newest_first(rows, |f| f.created_at))
    }

    async fn update_favorite(&self, favorite: &Favorite) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        let stored = state
            .favorites
            .iter_mut()
            .find(|f| f.id == favorite.id)
            .ok_or_else(|| LedgerError::NotFound(format!("favorite {}", favorite.id)))?;
        stored.nickname.clone_from(&favorite.nickname);
        stored.memo.clone_from(&favorite.memo);
        Ok(())
    }

    async fn delete_favorite(&self, id: FavoriteId, account: AccountId) -> LedgerResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.favorites.len();
        state
            .favorites
            .retain(|f| !(f.id == id && f.account_id == account));
        Ok(state.favorites.len() < before)
    }
}

#[async_trait]
impl IdempotencyRepository for MemoryStore {
    async fn find_record(
        &self,
        scope: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Option<IdempotencyRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .idempotency
            .get(&(scope.to_string(), key.to_string()))
            .filter(|r| r.expires_at > now)
            .cloned())
    }

    async fn save_record(&self, record: &IdempotencyRecord) -> LedgerResult<()> {
        let mut state = self.state.lock().await;
        let slot = (record.scope.clone(), record.key.clone());
        let replace = state
            .idempotency
            .get(&slot)
            .is_none_or(|existing| existing.expires_at <= record.created_at);
        if replace {
            state.idempotency.insert(slot, record.clone());
        }
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> LedgerResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.idempotency.len();
        state.idempotency.retain(|_, r| r.expires_at > now);
        Ok((before - state.idempotency.len()) as u64)
    }
}
