//! Redacted simple-password input.

use serde::{Deserialize, Serialize};

/// A simple password as typed by the user. `Debug` never shows the digits.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimplePassword(String);

impl SimplePassword {
    /// Wraps raw input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw digits.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SimplePassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SimplePassword(******)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let pin = SimplePassword::new("123456");
        assert!(!format!("{pin:?}").contains("123456"));
        assert_eq!(pin.expose(), "123456");
    }
}
