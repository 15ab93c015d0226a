//! Simple-password hashing and verification.
//!
//! This module provides:
//! - Argon2id hashing of 6-digit simple passwords
//! - Attempt counting and automatic locking on repeated mismatches
//! - Registration and change flows gated by the login password

mod hasher;
mod secret;
mod simple_password;

pub use hasher::{PasswordError, PinHasher};
pub use secret::SimplePassword;
pub use simple_password::SimplePasswords;
