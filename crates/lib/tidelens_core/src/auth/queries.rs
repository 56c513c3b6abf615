//! Credential-store database queries.
//!
//! Thin sqlx wrappers; all policy (ordering, audit, side-effect handling)
//! lives in `crate::account`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::AuthError;
use crate::models::auth::{
    EmailCategory, LoginAttempt, LoginAuditEntry, OtpPurpose, User, UserWithPassword,
};
use crate::uuid::uuidv7;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Fetch a user by email, including the stored password hash.
pub async fn find_user_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<UserWithPassword>, AuthError> {
    let row = sqlx::query_as::<
        _,
        (
            String,
            String,
            Option<String>,
            Option<String>,
            bool,
            Option<String>,
        ),
    >(
        "SELECT id::text, email, name, password_hash, email_verified, profile_image_url \
         FROM users WHERE email = $1",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(
        |(id, email, name, password_hash, email_verified, profile_image_url)| UserWithPassword {
            user: User {
                id,
                email,
                name,
                email_verified,
                profile_image_url,
            },
            password_hash,
        },
    ))
}

/// Fetch a user by ID.
pub async fn get_user_by_id(pool: &PgPool, user_id: &str) -> Result<Option<User>, AuthError> {
    let row = sqlx::query_as::<_, (String, Option<String>, bool, Option<String>)>(
        "SELECT email, name, email_verified, profile_image_url FROM users WHERE id = $1::uuid",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(
        row.map(|(email, name, email_verified, profile_image_url)| User {
            id: user_id.to_string(),
            email,
            name,
            email_verified,
            profile_image_url,
        }),
    )
}

/// Create a new user, returning the user ID. `password_hash` is None for
/// federated-identity-only accounts.
pub async fn create_user(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    password_hash: Option<&str>,
) -> Result<String, AuthError> {
    let user_id = sqlx::query_scalar::<_, String>(
        "INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) RETURNING id::text",
    )
    .bind(email)
    .bind(name)
    .bind(password_hash)
    .fetch_one(pool)
    .await?;
    Ok(user_id)
}

/// Replace a user's password hash.
pub async fn update_password(
    pool: &PgPool,
    user_id: &str,
    password_hash: &str,
) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1::uuid")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(())
}

/// Mark a user's email address as verified.
pub async fn set_email_verified(pool: &PgPool, user_id: &str) -> Result<(), AuthError> {
    sqlx::query("UPDATE users SET email_verified = TRUE WHERE id = $1::uuid")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a user row. Returns false when no row existed.
pub async fn delete_user(pool: &PgPool, user_id: &str) -> Result<bool, AuthError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1::uuid")
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// ---------------------------------------------------------------------------
// OTP records
// ---------------------------------------------------------------------------

/// Persist a freshly issued OTP record. Prior records for the same
/// (user, purpose) are left in place; validation targets the most recent.
pub async fn create_otp(
    pool: &PgPool,
    user_id: &str,
    purpose: OtpPurpose,
    code: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO otp_verifications (id, user_id, purpose, code, expires_at) \
         VALUES ($1, $2::uuid, $3, $4, $5)",
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(purpose.as_str())
    .bind(code)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically consume the most recent unconsumed OTP for (user, purpose),
/// provided the code matches and the record has not expired.
///
/// The conditional UPDATE is the whole check-and-consume step: two racing
/// validations of the same code see exactly one row updated between them.
pub async fn consume_latest_otp(
    pool: &PgPool,
    user_id: &str,
    purpose: OtpPurpose,
    code: &str,
) -> Result<bool, AuthError> {
    let consumed = sqlx::query_scalar::<_, String>(
        "UPDATE otp_verifications SET consumed = TRUE \
         WHERE id = ( \
             SELECT id FROM otp_verifications \
              WHERE user_id = $1::uuid AND purpose = $2 AND consumed = FALSE \
              ORDER BY created_at DESC \
              LIMIT 1) \
           AND code = $3 \
           AND expires_at > now() \
           AND consumed = FALSE \
         RETURNING id::text",
    )
    .bind(user_id)
    .bind(purpose.as_str())
    .bind(code)
    .fetch_optional(pool)
    .await?;
    Ok(consumed.is_some())
}

// ---------------------------------------------------------------------------
// Password-reset tokens
// ---------------------------------------------------------------------------

/// Store a reset token hash with its expiry.
pub async fn create_reset_token(
    pool: &PgPool,
    user_id: &str,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO password_reset_tokens (id, user_id, token_hash, expires_at) \
         VALUES ($1, $2::uuid, $3, $4)",
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically mark a reset token used, returning its user ID.
///
/// A token already marked used fails here regardless of expiry; the
/// conditional UPDATE guarantees at most one caller ever gets the user ID.
pub async fn consume_reset_token(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<String>, AuthError> {
    let user_id = sqlx::query_scalar::<_, String>(
        "UPDATE password_reset_tokens SET used = TRUE \
         WHERE token_hash = $1 AND used = FALSE AND expires_at > now() \
         RETURNING user_id::text",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(user_id)
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Store a session token hash for a user.
pub async fn create_session(
    pool: &PgPool,
    token_hash: &str,
    user_id: &str,
) -> Result<(), AuthError> {
    sqlx::query("INSERT INTO sessions (id, token_hash, user_id) VALUES ($1, $2, $3::uuid)")
        .bind(uuidv7())
        .bind(token_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Resolve a session token hash to its user ID. Pure lookup, no side effects.
pub async fn find_session_user(
    pool: &PgPool,
    token_hash: &str,
) -> Result<Option<String>, AuthError> {
    let row = sqlx::query_scalar::<_, String>(
        "SELECT user_id::text FROM sessions WHERE token_hash = $1",
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Delete a session row by token hash (logout).
pub async fn delete_session(pool: &PgPool, token_hash: &str) -> Result<(), AuthError> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Audit trails (append-only)
// ---------------------------------------------------------------------------

/// Append one login attempt record.
pub async fn append_login_attempt(
    pool: &PgPool,
    attempt: &LoginAttempt,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO login_audits \
         (id, user_id, email, ip_address, user_agent, success, failure_reason) \
         VALUES ($1, $2::uuid, $3, $4, $5, $6, $7)",
    )
    .bind(uuidv7())
    .bind(attempt.user_id.as_deref())
    .bind(&attempt.email)
    .bind(attempt.ip_address.as_deref())
    .bind(attempt.user_agent.as_deref())
    .bind(attempt.success)
    .bind(attempt.failure_reason.map(|r| r.as_str()))
    .execute(pool)
    .await?;
    Ok(())
}

/// Read a user's login history, most recent first.
pub async fn login_history(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<LoginAuditEntry>, AuthError> {
    let rows = sqlx::query_as::<
        _,
        (
            String,
            String,
            Option<String>,
            Option<String>,
            bool,
            Option<String>,
            DateTime<Utc>,
        ),
    >(
        "SELECT id::text, email, ip_address, user_agent, success, failure_reason, created_at \
         FROM login_audits WHERE user_id = $1::uuid \
         ORDER BY created_at DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, email, ip_address, user_agent, success, failure_reason, created_at)| {
                LoginAuditEntry {
                    id,
                    email,
                    ip_address,
                    user_agent,
                    success,
                    failure_reason,
                    created_at,
                }
            },
        )
        .collect())
}

/// Append one email notification record.
pub async fn append_email_record(
    pool: &PgPool,
    user_id: Option<&str>,
    recipient: &str,
    category: EmailCategory,
    subject: &str,
    success: bool,
    error: Option<&str>,
) -> Result<(), AuthError> {
    sqlx::query(
        "INSERT INTO email_notifications \
         (id, user_id, recipient, category, subject, success, error) \
         VALUES ($1, $2::uuid, $3, $4, $5, $6, $7)",
    )
    .bind(uuidv7())
    .bind(user_id)
    .bind(recipient)
    .bind(category.as_str())
    .bind(subject)
    .bind(success)
    .bind(error)
    .execute(pool)
    .await?;
    Ok(())
}
