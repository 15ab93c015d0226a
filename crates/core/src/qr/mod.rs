//! QR payments: single-use seller intents with a 10-minute expiry.
//!
//! Generation and payment run through the transfer engine; this module
//! holds the intent model and the token format.

mod code;
mod types;

pub use code::generate_qr_code;
pub use types::{QR_VALIDITY, QrPaymentIntent, QrStatus};
