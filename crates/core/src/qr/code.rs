//! QR payment tokens.
//!
//! Format: `QR_{yyyymmdd}_{token}` where `token` is 24 random bytes from the
//! OS-seeded thread RNG, base64url-encoded (192 bits of entropy).

use chrono::{DateTime, Utc};
use rand::Rng;

/// Random bytes per token.
const TOKEN_BYTES: usize = 24;

/// Generates a fresh, unguessable QR code.
#[must_use]
pub fn generate_qr_code(now: DateTime<Utc>) -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    format!("QR_{}_{}", now.format("%Y%m%d"), base64_url::encode(&bytes))
}
