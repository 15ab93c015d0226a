//! Property tests for request validation.

use chrono::{Duration, TimeZone, Utc};
use pocketbank_shared::types::Amount;
use proptest::prelude::*;

use super::validation::{
    MAX_SCHEDULE_HORIZON, MIN_SCHEDULE_LEAD, MIN_TRANSFER_AMOUNT, normalize_description,
    validate_amount, validate_schedule_window, validate_simple_password,
};

proptest! {
    #[test]
    fn prop_amount_accepted_iff_within_bounds(amount in any::<i64>(), max in 100i64..100_000_000) {
        let accepted = validate_amount(Amount::new(amount), MIN_TRANSFER_AMOUNT, Amount::new(max)).is_ok();
        prop_assert_eq!(accepted, (100..=max).contains(&amount));
    }

    #[test]
    fn prop_any_six_digits_is_a_valid_pin(pin in "[0-9]{6}") {
        prop_assert!(validate_simple_password(&pin).is_ok());
    }

    #[test]
    fn prop_other_lengths_are_rejected(pin in "[0-9]{0,5}|[0-9]{7,12}") {
        prop_assert!(validate_simple_password(&pin).is_err());
    }

    #[test]
    fn prop_schedule_window(offset_secs in -86_400i64..(400 * 86_400)) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let offset = Duration::seconds(offset_secs);
        let expected = offset >= MIN_SCHEDULE_LEAD && offset <= MAX_SCHEDULE_HORIZON;
        prop_assert_eq!(validate_schedule_window(now + offset, now).is_ok(), expected);
    }

    #[test]
    fn prop_normalized_description_never_exceeds_limit(text in ".{0,300}") {
        if let Ok(normalized) = normalize_description(Some(&text)) {
            prop_assert!(normalized.chars().count() <= 200);
            prop_assert_eq!(normalized.trim(), normalized.as_str());
        }
    }
}
