//! Simple-password hashing with Argon2id.
//!
//! Uses the recommended Argon2id variant. Cost parameters come from
//! configuration so tests can run with cheap ones; verification reads the
//! parameters back out of the stored PHC string.

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, Version,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Errors that can occur during password operations.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Cost parameters are out of range.
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    /// Failed to hash password.
    #[error("failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password.
    #[error("failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format.
    #[error("invalid password hash format")]
    InvalidHash,
}

/// Argon2id hasher with fixed cost parameters.
#[derive(Debug, Clone)]
pub struct PinHasher {
    params: Params,
}

impl PinHasher {
    /// Creates a hasher with `memory_kib` memory cost and `iterations` passes.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidParams` if argon2 rejects the values.
    pub fn new(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;
        Ok(Self { params })
    }

    /// Hashes a password.
    ///
    /// # Returns
    ///
    /// The hashed password as a PHC string format.
    ///
    /// # Example
    ///
    /// ```
    /// use pocketbank_core::auth::PinHasher;
    ///
    /// let hasher = PinHasher::new(8, 1).unwrap();
    /// let hash = hasher.hash("123456").unwrap();
    /// assert!(hash.starts_with("$argon2id$"));
    /// ```
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    /// Verifies a password against a hash.
    ///
    /// # Returns
    ///
    /// `true` if the password matches, `false` otherwise.
    ///
    /// # Errors
    ///
    /// Returns `PasswordError::InvalidHash` if the hash format is invalid.
    /// Returns `PasswordError::VerifyError` if verification fails unexpectedly.
    ///
    /// # Example
    ///
    /// ```
    /// use pocketbank_core::auth::PinHasher;
    ///
    /// let hasher = PinHasher::new(8, 1).unwrap();
    /// let hash = hasher.hash("123456").unwrap();
    /// assert!(hasher.verify("123456", &hash).unwrap());
    /// assert!(!hasher.verify("654321", &hash).unwrap());
    /// ```
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHash)?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PasswordError::VerifyError(e.to_string())),
        }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}
