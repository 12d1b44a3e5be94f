//! Password hashing for the credential store.
//!
//! Argon2id with per-secret random salts. Verification goes through
//! `argon2`'s constant-time comparison, so a mismatch does not leak timing.
//! Raw secrets and digests are never logged.

use anyhow::{anyhow, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a secret into a PHC-format digest.
///
/// # Errors
/// Returns an error if the hasher rejects the input.
pub fn hash(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map(|digest| digest.to_string())
        .map_err(|err| anyhow!("password hashing failed: {err}"))
}

/// Verify a secret against a stored digest.
///
/// An unparsable digest counts as a mismatch rather than an error so a
/// corrupted row cannot be told apart from a wrong password by the caller.
#[must_use]
pub fn verify(secret: &str, digest: &str) -> bool {
    PasswordHash::new(digest)
        .map(|parsed| {
            Argon2::default()
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}
