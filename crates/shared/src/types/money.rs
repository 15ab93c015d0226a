//! Integer money amounts.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are whole won (the currency has no minor unit in practice), so a
//! checked `i64` is exact and large enough for any balance.

use serde::{Deserialize, Serialize};

/// A monetary amount in won.
///
/// Arithmetic is checked: every operation that could overflow returns
/// `None` instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Zero won.
    pub const ZERO: Self = Self(0);

    /// Wraps a raw value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Returns true if the amount is strictly positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::iter::Sum for Amount {
    /// Saturates instead of overflowing; sums are only used for reporting.
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.fold(0i64, |acc, a| acc.saturating_add(a.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_amount_checked_add_overflow() {
        assert_eq!(Amount::new(i64::MAX).checked_add(Amount::new(1)), None);
        assert_eq!(
            Amount::new(40).checked_add(Amount::new(2)),
            Some(Amount::new(42))
        );
    }

    #[test]
    fn test_amount_checked_sub() {
        assert_eq!(
            Amount::new(100).checked_sub(Amount::new(30)),
            Some(Amount::new(70))
        );
        assert_eq!(Amount::new(i64::MIN).checked_sub(Amount::new(1)), None);
    }

    #[test]
    fn test_amount_sign() {
        assert!(Amount::new(1).is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::ZERO.is_negative());
        assert!(Amount::new(-1).is_negative());
    }

    #[test]
    fn test_amount_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Amount::new(3000)).unwrap(), "3000");
        let parsed: Amount = serde_json::from_str("7000").unwrap();
        assert_eq!(parsed, Amount::new(7000));
    }

    proptest! {
        #[test]
        fn prop_add_then_sub_is_identity(a in 0i64..1_000_000_000_000, b in 0i64..1_000_000_000_000) {
            let sum = Amount::new(a).checked_add(Amount::new(b)).unwrap();
            prop_assert_eq!(sum.checked_sub(Amount::new(b)), Some(Amount::new(a)));
        }

        #[test]
        fn prop_sum_matches_fold(values in proptest::collection::vec(0i64..1_000_000, 0..50)) {
            let total: Amount = values.iter().copied().map(Amount::new).sum();
            prop_assert_eq!(total.value(), values.iter().sum::<i64>());
        }
    }
}
