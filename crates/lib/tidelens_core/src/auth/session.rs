//! Session issuance and resolution.
//!
//! The transport layer owns the token (cookie); this module only maps
//! token -> user reference. Dangling sessions (user deleted) are detected
//! by the orchestrator, not here.

use sqlx::PgPool;

use super::{AuthError, generate_token, hash_token, queries};

/// Issue a session for a user, returning the plaintext token.
pub async fn create(pool: &PgPool, user_id: &str) -> Result<String, AuthError> {
    let token = generate_token();
    queries::create_session(pool, &hash_token(&token), user_id).await?;
    Ok(token)
}

/// Resolve a session token to a user ID. Pure lookup, no side effects.
pub async fn resolve(pool: &PgPool, token: &str) -> Result<Option<String>, AuthError> {
    queries::find_session_user(pool, &hash_token(token)).await
}

/// Delete the session for a token (logout).
pub async fn delete(pool: &PgPool, token: &str) -> Result<(), AuthError> {
    queries::delete_session(pool, &hash_token(token)).await
}
