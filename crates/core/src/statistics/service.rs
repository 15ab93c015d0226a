//! Monthly statistics over the caller's completed transactions.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Days, NaiveDate};
use pocketbank_shared::types::{AccountId, Amount, UserId};

use super::types::{CategoryStatistic, DailyTrend, Percent, TransactionStatistics};
use crate::account::require_account;
use crate::clock::Clock;
use crate::ledger::{LedgerError, LedgerResult, Transaction, TransactionType};
use crate::ports::Repositories;

/// Days covered by the daily trend, today included.
pub const TREND_DAYS: u64 = 30;

/// Builds deposit/withdrawal statistics.
pub struct StatisticsService {
    repos: Arc<dyn Repositories>,
    clock: Arc<dyn Clock>,
}

impl StatisticsService {
    /// Creates the service.
    #[must_use]
    pub fn new(repos: Arc<dyn Repositories>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Statistics for the caller's account as of today (UTC).
    pub async fn for_user(&self, user: UserId) -> LedgerResult<TransactionStatistics> {
        let account = require_account(self.repos.as_ref(), user).await?;
        let today = self.clock.now().date_naive();
        let window = Window::ending(today)?;

        let from = midnight(window.first_day());
        let until = midnight(window.tomorrow);
        let transactions = self
            .repos
            .ledger()
            .completed_between(account.id, from, until)
            .await?;

        Ok(Self::summarize(account.id, &transactions, today))
    }

    /// Aggregates completed transactions seen from `account`.
    ///
    /// Transactions outside last month, this month and the trend window are
    /// ignored.
    #[must_use]
    pub fn summarize(
        account: AccountId,
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> TransactionStatistics {
        let Ok(window) = Window::ending(today) else {
            return TransactionStatistics::empty();
        };

        let mut this_month = Flows::default();
        let mut last_month = Flows::default();
        let mut categories: BTreeMap<usize, Amount> = BTreeMap::new();
        let mut daily: BTreeMap<NaiveDate, Flows> = BTreeMap::new();

        for tx in transactions {
            let Some(direction) = Direction::of(tx, account) else {
                continue;
            };
            let date = tx.created_at.date_naive();

            if date >= window.this_month && date < window.tomorrow {
                this_month.add(direction, tx.amount);
                if direction == Direction::Out {
                    let slot = categories.entry(category_index(tx.tx_type)).or_default();
                    *slot = slot.checked_add(tx.amount).unwrap_or(*slot);
                }
            } else if date >= window.last_month && date < window.this_month {
                last_month.add(direction, tx.amount);
            }

            if date >= window.trend_start && date < window.tomorrow {
                daily.entry(date).or_default().add(direction, tx.amount);
            }
        }

        let mut category_statistics: Vec<CategoryStatistic> = categories
            .into_iter()
            .map(|(index, amount)| CategoryStatistic {
                category: TransactionType::ALL[index],
                amount,
                percentage: Percent::ratio(amount.value(), this_month.withdrawal.value()),
            })
            .collect();
        category_statistics.sort_by(|a, b| b.amount.cmp(&a.amount));

        let daily_trends = window
            .trend_start
            .iter_days()
            .take_while(|d| *d < window.tomorrow)
            .map(|date| {
                let flows = daily.get(&date).copied().unwrap_or_default();
                DailyTrend {
                    date,
                    deposit: flows.deposit,
                    withdrawal: flows.withdrawal,
                }
            })
            .collect();

        TransactionStatistics {
            total_deposit: this_month.deposit,
            total_withdrawal: this_month.withdrawal,
            deposit_change_rate: Percent::change(this_month.deposit, last_month.deposit),
            withdrawal_change_rate: Percent::change(this_month.withdrawal, last_month.withdrawal),
            category_statistics,
            daily_trends,
        }
    }
}

impl TransactionStatistics {
    fn empty() -> Self {
        Self {
            total_deposit: Amount::ZERO,
            total_withdrawal: Amount::ZERO,
            deposit_change_rate: Percent::ZERO,
            withdrawal_change_rate: Percent::ZERO,
            category_statistics: Vec::new(),
            daily_trends: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

impl Direction {
    fn of(tx: &Transaction, account: AccountId) -> Option<Self> {
        if tx.is_credit_for(account) {
            Some(Self::In)
        } else if tx.from_account_id == account {
            Some(Self::Out)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Flows {
    deposit: Amount,
    withdrawal: Amount,
}

impl Flows {
    fn add(&mut self, direction: Direction, amount: Amount) {
        let slot = match direction {
            Direction::In => &mut self.deposit,
            Direction::Out => &mut self.withdrawal,
        };
        *slot = slot.checked_add(amount).unwrap_or(*slot);
    }
}

/// Date boundaries, all inclusive starts.
#[derive(Debug, Clone, Copy)]
struct Window {
    last_month: NaiveDate,
    this_month: NaiveDate,
    trend_start: NaiveDate,
    tomorrow: NaiveDate,
}

impl Window {
    fn ending(today: NaiveDate) -> LedgerResult<Self> {
        let out_of_range = || LedgerError::Internal(format!("date out of range: {today}"));
        let this_month = today.with_day(1).ok_or_else(out_of_range)?;
        let last_month = this_month
            .pred_opt()
            .and_then(|d| d.with_day(1))
            .ok_or_else(out_of_range)?;
        let trend_start = today
            .checked_sub_days(Days::new(TREND_DAYS - 1))
            .ok_or_else(out_of_range)?;
        let tomorrow = today.succ_opt().ok_or_else(out_of_range)?;
        Ok(Self {
            last_month,
            this_month,
            trend_start,
            tomorrow,
        })
    }

    fn first_day(&self) -> NaiveDate {
        self.last_month.min(self.trend_start)
    }
}

fn midnight(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn category_index(tx_type: TransactionType) -> usize {
    TransactionType::ALL
        .iter()
        .position(|t| *t == tx_type)
        .unwrap_or_default()
}
