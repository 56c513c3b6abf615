//! Append-only login audit log.

use sqlx::PgPool;
use tracing::error;

use super::{AuthError, queries};
use crate::models::auth::{LoginAttempt, LoginAuditEntry};

/// Append one audit record for a login attempt.
///
/// Never fails the caller: if the insert itself fails, the error is logged
/// here and swallowed — an audit-store outage must not change a login
/// outcome that has already been determined.
pub async fn record(pool: &PgPool, attempt: &LoginAttempt) {
    if let Err(e) = queries::append_login_attempt(pool, attempt).await {
        error!(
            error = %e,
            email = %attempt.email,
            success = attempt.success,
            "failed to append login audit record"
        );
    }
}

/// Read a user's login history, most recent first.
pub async fn history(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<LoginAuditEntry>, AuthError> {
    queries::login_history(pool, user_id, limit).await
}
