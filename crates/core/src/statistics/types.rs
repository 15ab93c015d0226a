//! Statistics response types.

use std::str::FromStr;

use chrono::NaiveDate;
use pocketbank_shared::types::Amount;
use serde::{Serialize, Serializer};

use crate::ledger::TransactionType;

/// A percentage with one decimal place, held as integer tenths.
///
/// Serializes as a plain JSON number (`12.5`, `-3.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Percent(i64);

impl Percent {
    /// 0.0%.
    pub const ZERO: Self = Self(0);

    /// Builds from tenths of a percent.
    #[must_use]
    pub const fn from_tenths(tenths: i64) -> Self {
        Self(tenths)
    }

    /// Returns tenths of a percent.
    #[must_use]
    pub const fn tenths(self) -> i64 {
        self.0
    }

    /// `part / whole` as a percentage, rounded half away from zero.
    /// Zero when `whole` is zero.
    #[must_use]
    pub fn ratio(part: i64, whole: i64) -> Self {
        if whole == 0 {
            return Self::ZERO;
        }
        let numerator = i128::from(part) * 1000;
        let whole = i128::from(whole);
        let mut quotient = numerator / whole;
        let remainder = numerator % whole;
        if remainder.abs() * 2 >= whole.abs() {
            quotient += if (numerator < 0) == (whole < 0) { 1 } else { -1 };
        }
        Self(i64::try_from(quotient).unwrap_or(if quotient < 0 { i64::MIN } else { i64::MAX }))
    }

    /// Change from `previous` to `current`.
    ///
    /// Growth from nothing counts as +100.0%.
    #[must_use]
    pub fn change(current: Amount, previous: Amount) -> Self {
        match (previous.value(), current.value()) {
            (0, 0) => Self::ZERO,
            (0, _) => Self(1000),
            (prev, cur) => Self::ratio(cur.saturating_sub(prev), prev),
        }
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{}", abs / 10, abs % 10)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Number::from_str(&self.to_string())
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// Spending of one transaction type this month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStatistic {
    /// Transaction type.
    pub category: TransactionType,
    /// Total debited this month.
    pub amount: Amount,
    /// Share of this month's withdrawals.
    pub percentage: Percent,
}

/// Credits and debits of one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTrend {
    /// UTC date.
    pub date: NaiveDate,
    /// Credited that day.
    pub deposit: Amount,
    /// Debited that day.
    pub withdrawal: Amount,
}

/// Monthly deposit and withdrawal statistics for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatistics {
    /// Credited this month.
    pub total_deposit: Amount,
    /// Debited this month.
    pub total_withdrawal: Amount,
    /// Deposit change against last month.
    pub deposit_change_rate: Percent,
    /// Withdrawal change against last month.
    pub withdrawal_change_rate: Percent,
    /// This month's withdrawals by type, largest first.
    pub category_statistics: Vec<CategoryStatistic>,
    /// The last 30 days, oldest first.
    pub daily_trends: Vec<DailyTrend>,
}
