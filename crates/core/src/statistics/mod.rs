//! Deposit and withdrawal statistics.
//!
//! Month-over-month totals, spending by transaction type and a 30-day daily
//! trend, all derived from COMPLETED ledger rows.

mod service;
mod types;

pub use service::{StatisticsService, TREND_DAYS};
pub use types::{CategoryStatistic, DailyTrend, Percent, TransactionStatistics};
