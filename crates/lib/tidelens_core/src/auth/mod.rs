//! Authentication primitives.
//!
//! Provides password hashing, OTP issuance/validation, reset-token and
//! session management, the login audit log, and the credential-store
//! queries shared by the account lifecycle workflows.

pub mod audit;
pub mod otp;
pub mod password;
pub mod queries;
pub mod reset;
pub mod session;

use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong credentials, or an expired/consumed token or OTP. Carries no
    /// detail: user-not-found and wrong-password must be indistinguishable
    /// to the caller.
    #[error("Invalid credentials")]
    CredentialError,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Mail delivery failed: {0}")]
    MailError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Opaque token length for sessions and reset tokens.
const TOKEN_LEN: usize = 64;

/// Generate a cryptographically random opaque token (64 alphanumeric chars).
pub(crate) fn generate_token() -> String {
    rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// SHA-256 hash a token for storage; only the digest ever hits the database.
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
