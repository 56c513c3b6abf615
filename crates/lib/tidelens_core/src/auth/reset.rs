//! Password-reset tokens: single-use, expiring.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use super::{AuthError, generate_token, hash_token, queries};

/// Reset token lifetime.
const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// Create a reset token for a user. The caller gets the plaintext token
/// (for the email); only its SHA-256 digest is stored.
pub async fn create(pool: &PgPool, user_id: &str) -> Result<String, AuthError> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::hours(RESET_TOKEN_TTL_HOURS);
    queries::create_reset_token(pool, user_id, &hash_token(&token), expires_at).await?;
    Ok(token)
}

/// Verify a reset token, returning the user ID on success.
///
/// Fails softly (None) for unknown, expired, or already-used tokens. The
/// used flag is set in the same conditional UPDATE that returns the user
/// ID, so concurrent verifications of one token cannot both succeed.
pub async fn verify(pool: &PgPool, token: &str) -> Result<Option<String>, AuthError> {
    queries::consume_reset_token(pool, &hash_token(token)).await
}
