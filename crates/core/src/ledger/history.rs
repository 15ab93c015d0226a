//! Transaction history as seen by one account.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pocketbank_shared::types::{
    AccountId, AccountNumber, Amount, PageRequest, PageResponse, TransactionId, UserId,
};
use serde::{Deserialize, Serialize};

use super::error::{LedgerError, LedgerResult};
use super::types::{Transaction, TransactionStatus, TransactionType};
use crate::account::require_account;
use crate::ports::{Repositories, TransactionFilter};

/// One history row from the viewer's side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionView {
    /// Transaction ID.
    pub transaction_id: TransactionId,
    /// Type.
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Amount.
    pub amount: Amount,
    /// Originating account number.
    pub from_account: AccountNumber,
    /// Credited account number; absent for deposits.
    pub to_account: Option<AccountNumber>,
    /// The other party's name, if there is one.
    pub counterparty_name: Option<String>,
    /// Description.
    pub description: String,
    /// Outcome.
    pub status: TransactionStatus,
    /// True if this row credited the viewer.
    pub incoming: bool,
    /// Viewer's balance after posting, when the viewer originated it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_after: Option<Amount>,
    /// Machine code for FAILED rows.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Posting time.
    pub created_at: DateTime<Utc>,
}

impl TransactionView {
    /// Projects `tx` for `viewer`.
    #[must_use]
    pub fn for_account(tx: Transaction, viewer: AccountId) -> Self {
        let counterparty_name = tx.counterparty_name(viewer).map(str::to_string);
        let incoming = tx.is_credit_for(viewer);
        let balance_after = (tx.from_account_id == viewer).then_some(tx.balance_after);
        Self {
            transaction_id: tx.id,
            tx_type: tx.tx_type,
            amount: tx.amount,
            from_account: tx.from_account_number,
            to_account: tx.to_account_number,
            counterparty_name,
            description: tx.description,
            status: tx.status,
            incoming,
            balance_after,
            failure_reason: tx.failure_reason,
            created_at: tx.created_at,
        }
    }
}

/// Read access to the caller's ledger rows.
pub struct TransactionHistory {
    repos: Arc<dyn Repositories>,
}

impl TransactionHistory {
    /// Creates the service.
    #[must_use]
    pub fn new(repos: Arc<dyn Repositories>) -> Self {
        Self { repos }
    }

    /// Lists the caller's history, newest first.
    pub async fn list(
        &self,
        user: UserId,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> LedgerResult<PageResponse<TransactionView>> {
        if let (Some(start), Some(end)) = (filter.start_date, filter.end_date)
            && start > end
        {
            return Err(LedgerError::validation(
                "startDate must not be after endDate",
            ));
        }
        let account = require_account(self.repos.as_ref(), user).await?;
        let page = self
            .repos
            .ledger()
            .list_transactions(account.id, filter, page.clamped())
            .await?;
        Ok(page.map(|tx| TransactionView::for_account(tx, account.id)))
    }

    /// Returns one row the caller may see.
    pub async fn get(&self, user: UserId, id: TransactionId) -> LedgerResult<TransactionView> {
        let account = require_account(self.repos.as_ref(), user).await?;
        self.repos
            .ledger()
            .find_transaction(id)
            .await?
            .filter(|tx| tx.visible_to(account.id))
            .map(|tx| TransactionView::for_account(tx, account.id))
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))
    }
}
