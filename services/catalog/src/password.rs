//! Password hashing and verification
//!
//! Passwords are stored as Argon2 PHC strings. The salt is generated per call
//! and embedded in the string, so verification needs nothing but the hash.

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use thiserror::Error;
use tracing::warn;

/// Hashing failure. Only raised by the hasher itself, never by a mismatch.
#[derive(Error, Debug)]
#[error("Failed to hash password: {0}")]
pub struct PasswordError(String);

/// Well-formed hash of no password, at the default Argon2 cost
///
/// Verified against when a login names no user, so both failures pay for one
/// Argon2 run.
pub const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$ukVVO7+6AzfnOb4eRkPHnw$6TmcqLoQ5j4Y3US+iJAy3Msb4fI/jk6nFNZEiJ/UO3M";

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError(e.to_string()))
}

/// Verify a password against a stored hash
///
/// An unparsable stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(password_hash) {
        Ok(parsed_hash) => parsed_hash,
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
