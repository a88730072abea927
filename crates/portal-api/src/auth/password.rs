//! Password hashing and verification using Argon2id
//!
//! Two independent hasher capabilities exist, one per account role. The
//! algorithm is the same for both; the split keeps the role binding visible
//! at every call site so a future parameter change to one role cannot
//! silently affect the other. Hashes are PHC strings and self-describe
//! algorithm, parameters, and salt.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
}

/// Whether a stored string parses as a PHC-format hash
///
/// The startup bootstrap uses this to detect a mis-hashed admin row.
pub fn is_phc_hash(stored: &str) -> bool {
    PasswordHash::new(stored).is_ok()
}

fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

fn verify_password(stored_hash: &str, password: &str) -> bool {
    // A malformed stored hash reports a failed verification, never an error
    let parsed_hash = match PasswordHash::new(stored_hash) {
        Ok(hash) => hash,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hasher bound to student accounts
#[derive(Debug, Clone, Default)]
pub struct StudentHasher;

impl StudentHasher {
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_password(password)
    }

    pub fn verify(&self, stored_hash: &str, password: &str) -> bool {
        verify_password(stored_hash, password)
    }
}

/// Hasher bound to the admin account
#[derive(Debug, Clone, Default)]
pub struct AdminHasher;

impl AdminHasher {
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        hash_password(password)
    }

    pub fn verify(&self, stored_hash: &str, password: &str) -> bool {
        verify_password(stored_hash, password)
    }
}

/// Validate password strength
///
/// Checks if a password meets minimum security requirements:
/// - At least 8 characters
/// - At least 1 uppercase letter
/// - At least 1 lowercase letter
/// - At least 1 digit
/// - At least 1 special character
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err("Password must contain at least one uppercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_lowercase()) {
        return Err("Password must contain at least one lowercase letter".to_string());
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit".to_string());
    }

    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err("Password must contain at least one special character".to_string());
    }

    Ok(())
}
