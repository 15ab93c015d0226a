//! Twelve-digit account numbers.
//!
//! Input is accepted with or without separators (`123412341234`,
//! `1234-1234-1234`, `1234 1234 1234`); output is always `NNNN-NNNN-NNNN`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of digits in an account number.
pub const ACCOUNT_NUMBER_DIGITS: usize = 12;

/// Error returned when an account number cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("account number must be {ACCOUNT_NUMBER_DIGITS} digits, got '{0}'")]
pub struct InvalidAccountNumber(pub String);

/// A normalized account number (digits only internally).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Parses and normalizes user input.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountNumber` unless exactly twelve ASCII digits
    /// remain after stripping hyphens and spaces.
    pub fn parse(input: &str) -> Result<Self, InvalidAccountNumber> {
        let digits: String = input
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();

        if digits.len() == ACCOUNT_NUMBER_DIGITS && digits.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(digits))
        } else {
            Err(InvalidAccountNumber(input.to_string()))
        }
    }

    /// Returns the bare twelve digits, as stored.
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Returns the display form `NNNN-NNNN-NNNN`.
    #[must_use]
    pub fn formatted(&self) -> String {
        format!("{}-{}-{}", &self.0[0..4], &self.0[4..8], &self.0[8..12])
    }
}

impl std::fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl std::str::FromStr for AccountNumber {
    type Err = InvalidAccountNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AccountNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.formatted())
    }
}

impl<'de> Deserialize<'de> for AccountNumber {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("123412341234")]
    #[case("1234-1234-1234")]
    #[case("1234 1234 1234")]
    #[case(" 1234-1234 1234 ")]
    fn test_parse_normalizes(#[case] input: &str) {
        let number = AccountNumber::parse(input).unwrap();
        assert_eq!(number.digits(), "123412341234");
        assert_eq!(number.to_string(), "1234-1234-1234");
    }

    #[rstest]
    #[case("")]
    #[case("12341234123")]
    #[case("1234123412345")]
    #[case("1234-1234-123a")]
    #[case("１２３４１２３４１２３４")]
    fn test_parse_rejects(#[case] input: &str) {
        assert!(AccountNumber::parse(input).is_err());
    }

    #[test]
    fn test_serde_uses_formatted_form() {
        let number = AccountNumber::parse("110022003300").unwrap();
        assert_eq!(
            serde_json::to_string(&number).unwrap(),
            "\"1100-2200-3300\""
        );
        let back: AccountNumber = serde_json::from_str("\"110022003300\"").unwrap();
        assert_eq!(back, number);
        assert!(serde_json::from_str::<AccountNumber>("\"12\"").is_err());
    }
}
