//! Password storage. Plaintext never leaves this module; callers get an
//! Argon2id PHC string (`$argon2id$v=19$...`) with its own random salt.

use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::UserError;

fn argon2id() -> Argon2<'static> {
    Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default())
}

/// Hash a user's plaintext password for the `password_hash` column.
///
/// Hashing failures are internal errors; the message never includes the
/// plaintext.
pub fn hash_password(plain: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2id()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            UserError::Internal(anyhow::anyhow!("password hashing failed: {e}"))
        })
}

/// Check a plaintext against a stored `password_hash`.
#[cfg(test)]
pub(crate) fn verify_password(plain: &str, stored: &str) -> Result<bool, UserError> {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    let parsed = PasswordHash::new(stored)
        .map_err(|e| UserError::Internal(anyhow::anyhow!("stored hash is malformed: {e}")))?;
    Ok(argon2id().verify_password(plain.as_bytes(), &parsed).is_ok())
}
