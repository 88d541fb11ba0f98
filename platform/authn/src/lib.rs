//! Local password authentication.
//!
//! Passwords are stored as argon2id PHC strings, each with its own salt.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthnError {
    #[error("password is required")]
    EmptyPassword,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
    #[error("stored password hash is malformed")]
    MalformedHash,
    #[error("hash error: {0}")]
    Hash(String),
}

pub fn validate_password(password: &str) -> Result<(), AuthnError> {
    if password.is_empty() {
        return Err(AuthnError::EmptyPassword);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthnError::PasswordTooShort);
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AuthnError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthnError::Hash(err.to_string()))
}

/// `Ok(false)` on mismatch; an unparseable stored hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthnError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthnError::MalformedHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Random bytes rendered as lowercase hex, e.g. for upload name tokens.
pub fn random_hex(bytes: usize) -> String {
    use rand::RngCore;

    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
