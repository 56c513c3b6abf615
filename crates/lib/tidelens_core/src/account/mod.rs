//! Account lifecycle orchestration.
//!
//! Composes the credential store, password hasher, OTP/reset/session
//! managers, audit log, and mailer into the login, OTP, password-reset,
//! and deletion workflows. Each workflow performs its primary state change
//! first and then runs its side effects under a per-workflow policy:
//! delivery failure fails the request only where the caller would
//! otherwise believe a code or token went out (OTP issuance, reset
//! request); everywhere else it is recorded and swallowed.

use sqlx::PgPool;
use tracing::error;

use crate::auth::{AuthError, audit, otp, password, queries, reset, session};
use crate::mail::{Mailer, notify, templates};
use crate::models::auth::{
    EmailCategory, LoginAttempt, LoginAuditEntry, LoginFailureReason, OtpPurpose, SessionState,
    UserView,
};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

/// Default number of history rows returned to the caller.
const LOGIN_HISTORY_LIMIT: i64 = 50;

/// Client metadata attached to audited operations.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Successful login handed to the transport layer.
#[derive(Debug, Clone)]
pub struct LoginSuccess {
    pub session_token: String,
    pub user: UserView,
}

fn attempt(
    email: &str,
    client: &ClientInfo,
    user_id: Option<&str>,
    failure: Option<LoginFailureReason>,
) -> LoginAttempt {
    LoginAttempt {
        user_id: user_id.map(str::to_string),
        email: email.to_string(),
        ip_address: client.ip_address.clone(),
        user_agent: client.user_agent.clone(),
        success: failure.is_none(),
        failure_reason: failure,
    }
}

/// Authenticate with email + password.
///
/// Every branch appends exactly one audit record before returning. The
/// caller-visible error for an unknown user and a wrong password is the
/// same `CredentialError`; only the audit row keeps the precise reason.
/// The sign-in alert email goes out after success has been audited and its
/// failure never fails the login.
pub async fn login(
    pool: &PgPool,
    mailer: &dyn Mailer,
    email: &str,
    password_input: &str,
    client: &ClientInfo,
) -> Result<LoginSuccess, AuthError> {
    let email = email.trim();

    if email.is_empty() || password_input.is_empty() {
        audit::record(
            pool,
            &attempt(email, client, None, Some(LoginFailureReason::MissingCredentials)),
        )
        .await;
        return Err(AuthError::ValidationError(
            "Email and password are required".into(),
        ));
    }

    let Some(record) = queries::find_user_by_email(pool, email).await? else {
        audit::record(
            pool,
            &attempt(email, client, None, Some(LoginFailureReason::UserNotFound)),
        )
        .await;
        return Err(AuthError::CredentialError);
    };

    let user = record.user;
    let Some(hash) = record.password_hash else {
        audit::record(
            pool,
            &attempt(
                email,
                client,
                Some(&user.id),
                Some(LoginFailureReason::NoPasswordSet),
            ),
        )
        .await;
        return Err(AuthError::CredentialError);
    };

    if !password::verify_password(password_input, &hash)? {
        audit::record(
            pool,
            &attempt(
                email,
                client,
                Some(&user.id),
                Some(LoginFailureReason::InvalidPassword),
            ),
        )
        .await;
        return Err(AuthError::CredentialError);
    }

    let session_token = session::create(pool, &user.id).await?;

    // Success is audited before the alert email is attempted.
    audit::record(pool, &attempt(email, client, Some(&user.id), None)).await;

    let rendered = templates::login_alert(user.name.as_deref(), client.ip_address.as_deref());
    let _ = notify::notify(
        pool,
        mailer,
        Some(&user.id),
        &user.email,
        EmailCategory::LoginAlert,
        &rendered,
    )
    .await;

    Ok(LoginSuccess {
        session_token,
        user: user.into(),
    })
}

/// Issue an OTP for (user, purpose) and email it.
///
/// Delivery is load-bearing here: the caller must not be told a code went
/// out when it did not, so a failed send fails the request (after the
/// failed attempt has been recorded by the coordinator).
pub async fn request_otp(
    pool: &PgPool,
    mailer: &dyn Mailer,
    user_id: &str,
    purpose: OtpPurpose,
) -> Result<(), AuthError> {
    let user = queries::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".into()))?;

    let code = otp::issue(pool, user_id, purpose).await?;

    let rendered = templates::verification_code(user.name.as_deref(), &code, purpose);
    notify::notify(
        pool,
        mailer,
        Some(user_id),
        &user.email,
        EmailCategory::EmailVerification,
        &rendered,
    )
    .await
    .map_err(|e| AuthError::MailError(e.to_string()))?;

    Ok(())
}

/// Validate (and consume) an OTP.
///
/// On a successful `email_verification` validation the user's verified
/// flag is set afterwards; a failure updating the flag is logged and does
/// not change the result already determined for the caller.
pub async fn verify_otp(
    pool: &PgPool,
    user_id: &str,
    code: &str,
    purpose: OtpPurpose,
) -> Result<bool, AuthError> {
    if queries::get_user_by_id(pool, user_id).await?.is_none() {
        return Err(AuthError::NotFound("User not found".into()));
    }

    let valid = otp::validate(pool, user_id, code, purpose).await?;

    if valid && purpose == OtpPurpose::EmailVerification {
        if let Err(e) = queries::set_email_verified(pool, user_id).await {
            error!(error = %e, user_id, "failed to set email-verified flag after OTP validation");
        }
    }

    Ok(valid)
}

/// Create a password-reset token for the account behind `email` and send
/// it. Like OTP issuance, delivery is load-bearing: a failed send fails
/// the request.
pub async fn request_password_reset(
    pool: &PgPool,
    mailer: &dyn Mailer,
    email: &str,
) -> Result<(), AuthError> {
    let record = queries::find_user_by_email(pool, email)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".into()))?;
    let user = record.user;

    let token = reset::create(pool, &user.id).await?;

    let rendered = templates::password_reset(user.name.as_deref(), &token);
    notify::notify(
        pool,
        mailer,
        Some(&user.id),
        &user.email,
        EmailCategory::PasswordReset,
        &rendered,
    )
    .await
    .map_err(|e| AuthError::MailError(e.to_string()))?;

    Ok(())
}

/// Reset a password with a single-use token.
///
/// Input is validated before the token is consumed so a fixable request
/// does not burn the token. The confirmation email goes out after the new
/// hash is persisted and its failure never fails the reset.
pub async fn reset_password(
    pool: &PgPool,
    mailer: &dyn Mailer,
    token: &str,
    new_password: &str,
) -> Result<(), AuthError> {
    if new_password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::ValidationError(
            "Password must be at least 8 characters".into(),
        ));
    }

    let Some(user_id) = reset::verify(pool, token).await? else {
        return Err(AuthError::CredentialError);
    };

    let hash = password::hash_password(new_password)?;
    queries::update_password(pool, &user_id, &hash).await?;

    match queries::get_user_by_id(pool, &user_id).await {
        Ok(Some(user)) => {
            let rendered = templates::password_changed(user.name.as_deref());
            let _ = notify::notify(
                pool,
                mailer,
                Some(&user_id),
                &user.email,
                EmailCategory::PasswordChanged,
                &rendered,
            )
            .await;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, %user_id, "failed to load user for password-changed notice");
        }
    }

    Ok(())
}

/// Delete an account.
///
/// The deletion notice is sent while the user row still exists — once the
/// row is gone the address and name are no longer resolvable through this
/// lookup path. A failed send never blocks the deletion.
pub async fn delete_account(
    pool: &PgPool,
    mailer: &dyn Mailer,
    user_id: &str,
) -> Result<(), AuthError> {
    let user = queries::get_user_by_id(pool, user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".into()))?;

    let rendered = templates::account_deleted(user.name.as_deref());
    let _ = notify::notify(
        pool,
        mailer,
        Some(user_id),
        &user.email,
        EmailCategory::AccountDeleted,
        &rendered,
    )
    .await;

    if !queries::delete_user(pool, user_id).await? {
        return Err(AuthError::NotFound("User not found".into()));
    }

    Ok(())
}

/// Resolve a session token into the three-field state the transport needs.
///
/// A token whose session points at a deleted user yields
/// `cleanup_required: true` so the transport discards the stored token;
/// the stale row itself is left alone (resolution stays read-only).
pub async fn session_state(
    pool: &PgPool,
    token: Option<&str>,
) -> Result<SessionState, AuthError> {
    let Some(token) = token else {
        return Ok(SessionState::unauthenticated());
    };

    let Some(user_id) = session::resolve(pool, token).await? else {
        return Ok(SessionState::unauthenticated());
    };

    match queries::get_user_by_id(pool, &user_id).await? {
        Some(user) => Ok(SessionState {
            authenticated: true,
            user: Some(user.into()),
            cleanup_required: false,
        }),
        None => Ok(SessionState {
            authenticated: false,
            user: None,
            cleanup_required: true,
        }),
    }
}

/// Drop the session behind a token (logout). Unknown tokens are a no-op.
pub async fn logout(pool: &PgPool, token: &str) -> Result<(), AuthError> {
    session::delete(pool, token).await
}

/// Read a user's recent login attempts.
pub async fn login_history(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<LoginAuditEntry>, AuthError> {
    audit::history(pool, user_id, LOGIN_HISTORY_LIMIT).await
}
