//! Lifecycle workflow tests against an ephemeral PostgreSQL: OTP single
//! use and expiry, reset-token atomicity, audit rows, and deletion
//! ordering.

mod common;

use common::{MockMailer, start_pg};
use tidelens_core::account::{self, ClientInfo};
use tidelens_core::auth::{AuthError, otp, queries, reset, session};
use tidelens_core::models::auth::OtpPurpose;

#[tokio::test]
async fn otp_validates_once_then_never_again() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "otp-once@example.com", Some("password123")).await;

    let code = otp::issue(pool, &user_id, OtpPurpose::AccountSecurity)
        .await
        .expect("issue");

    assert!(
        otp::validate(pool, &user_id, &code, OtpPurpose::AccountSecurity)
            .await
            .expect("validate")
    );
    // Same code again: already consumed.
    assert!(
        !otp::validate(pool, &user_id, &code, OtpPurpose::AccountSecurity)
            .await
            .expect("validate")
    );

    test_db.stop().await;
}

#[tokio::test]
async fn otp_purpose_must_match_the_record() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "otp-purpose@example.com", Some("password123")).await;

    let code = otp::issue(pool, &user_id, OtpPurpose::ProfileChange)
        .await
        .expect("issue");

    assert!(
        !otp::validate(pool, &user_id, &code, OtpPurpose::AccountSecurity)
            .await
            .expect("validate")
    );
    // The mismatched attempt must not have consumed the record.
    assert!(
        otp::validate(pool, &user_id, &code, OtpPurpose::ProfileChange)
            .await
            .expect("validate")
    );

    test_db.stop().await;
}

#[tokio::test]
async fn expired_otp_is_rejected_and_reissue_verifies_the_email() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "otp-expiry@example.com", Some("password123")).await;

    let code = otp::issue(pool, &user_id, OtpPurpose::EmailVerification)
        .await
        .expect("issue");

    // Move the record 11 minutes into the past.
    sqlx::query(
        "UPDATE otp_verifications \
         SET created_at = created_at - interval '11 minutes', \
             expires_at = expires_at - interval '11 minutes' \
         WHERE user_id = $1::uuid",
    )
    .bind(&user_id)
    .execute(pool)
    .await
    .expect("backdate otp");

    // Correct code, expired record: deterministic rejection.
    assert!(
        !account::verify_otp(pool, &user_id, &code, OtpPurpose::EmailVerification)
            .await
            .expect("verify")
    );

    // Fresh issuance validates immediately and flips the verified flag.
    let code = otp::issue(pool, &user_id, OtpPurpose::EmailVerification)
        .await
        .expect("reissue");
    assert!(
        account::verify_otp(pool, &user_id, &code, OtpPurpose::EmailVerification)
            .await
            .expect("verify")
    );

    let verified: bool =
        sqlx::query_scalar("SELECT email_verified FROM users WHERE id = $1::uuid")
            .bind(&user_id)
            .fetch_one(pool)
            .await
            .expect("read flag");
    assert!(verified);

    test_db.stop().await;
}

#[tokio::test]
async fn validation_targets_the_most_recent_otp() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "otp-recent@example.com", Some("password123")).await;

    let old_code = otp::issue(pool, &user_id, OtpPurpose::AccountSecurity)
        .await
        .expect("issue old");
    // Keep a deterministic creation order even at coarse clock resolution.
    sqlx::query(
        "UPDATE otp_verifications SET created_at = created_at - interval '1 minute' \
         WHERE user_id = $1::uuid",
    )
    .bind(&user_id)
    .execute(pool)
    .await
    .expect("age old otp");

    let new_code = otp::issue(pool, &user_id, OtpPurpose::AccountSecurity)
        .await
        .expect("issue new");

    if old_code != new_code {
        // The superseded code no longer validates…
        assert!(
            !otp::validate(pool, &user_id, &old_code, OtpPurpose::AccountSecurity)
                .await
                .expect("validate old")
        );
    }
    // …the most recent one does.
    assert!(
        otp::validate(pool, &user_id, &new_code, OtpPurpose::AccountSecurity)
            .await
            .expect("validate new")
    );

    test_db.stop().await;
}

#[tokio::test]
async fn reset_token_is_single_use_even_within_its_expiry_window() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "reset-once@example.com", Some("password123")).await;

    let token = reset::create(pool, &user_id).await.expect("create");

    let first = reset::verify(pool, &token).await.expect("verify");
    assert_eq!(first.as_deref(), Some(user_id.as_str()));

    // Second verification fails although the expiry window is still open.
    let second = reset::verify(pool, &token).await.expect("verify");
    assert!(second.is_none());

    test_db.stop().await;
}

#[tokio::test]
async fn concurrent_reset_verifications_yield_exactly_one_success() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "reset-race@example.com", Some("password123")).await;

    let token = reset::create(pool, &user_id).await.expect("create");

    let (a, b) = tokio::join!(reset::verify(pool, &token), reset::verify(pool, &token));
    let successes = [a.expect("verify"), b.expect("verify")]
        .iter()
        .filter(|r| r.is_some())
        .count();
    assert_eq!(successes, 1);

    test_db.stop().await;
}

#[tokio::test]
async fn login_audits_every_branch_with_the_fixed_vocabulary() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let mailer = MockMailer::new();
    let client = ClientInfo::default();

    let user_id = common::seed_user(pool, "audit@example.com", Some("password123")).await;
    common::seed_user(pool, "federated@example.com", None).await;

    // user_not_found and invalid_password: byte-identical caller error.
    let unknown = account::login(pool, &mailer, "nobody@example.com", "whatever", &client)
        .await
        .expect_err("unknown user must fail");
    let wrong = account::login(pool, &mailer, "audit@example.com", "wrong-password", &client)
        .await
        .expect_err("wrong password must fail");
    assert_eq!(unknown.to_string(), wrong.to_string());
    assert!(matches!(unknown, AuthError::CredentialError));
    assert!(matches!(wrong, AuthError::CredentialError));

    // no_password_set is also generic for the caller.
    let federated = account::login(pool, &mailer, "federated@example.com", "anything", &client)
        .await
        .expect_err("passwordless account must fail");
    assert_eq!(federated.to_string(), unknown.to_string());

    // Missing credentials is a caller-fixable validation error.
    let missing = account::login(pool, &mailer, "", "", &client)
        .await
        .expect_err("missing credentials must fail");
    assert!(matches!(missing, AuthError::ValidationError(_)));

    // And one success.
    account::login(pool, &mailer, "audit@example.com", "password123", &client)
        .await
        .expect("login");

    // UUIDv7 ids are time-sortable and break sub-millisecond ties.
    let reasons: Vec<(bool, Option<String>)> = sqlx::query_as(
        "SELECT success, failure_reason FROM login_audits ORDER BY id",
    )
    .fetch_all(pool)
    .await
    .expect("read audit rows");

    assert_eq!(reasons.len(), 5);
    assert_eq!(reasons[0], (false, Some("user_not_found".into())));
    assert_eq!(reasons[1], (false, Some("invalid_password".into())));
    assert_eq!(reasons[2], (false, Some("no_password_set".into())));
    assert_eq!(reasons[3], (false, Some("missing_credentials".into())));
    assert_eq!(reasons[4], (true, None));

    // The successful attempt carries the user reference.
    let success_user: Option<String> = sqlx::query_scalar(
        "SELECT user_id::text FROM login_audits WHERE success = TRUE",
    )
    .fetch_one(pool)
    .await
    .expect("read success row");
    assert_eq!(success_user.as_deref(), Some(user_id.as_str()));

    test_db.stop().await;
}

#[tokio::test]
async fn login_succeeds_when_the_alert_email_fails() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let mailer = MockMailer::failing();
    common::seed_user(pool, "alert@example.com", Some("password123")).await;

    let outcome = account::login(
        pool,
        &mailer,
        "alert@example.com",
        "password123",
        &ClientInfo::default(),
    )
    .await
    .expect("login must survive a mail outage");
    assert!(!outcome.session_token.is_empty());

    // The failed alert is still recorded.
    let (success, category): (bool, String) = sqlx::query_as(
        "SELECT success, category FROM email_notifications ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_one(pool)
    .await
    .expect("read notification row");
    assert!(!success);
    assert_eq!(category, "login_alert");

    test_db.stop().await;
}

#[tokio::test]
async fn otp_issuance_fails_when_delivery_fails() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let mailer = MockMailer::failing();
    let user_id = common::seed_user(pool, "otp-mail@example.com", Some("password123")).await;

    let err = account::request_otp(pool, &mailer, &user_id, OtpPurpose::EmailVerification)
        .await
        .expect_err("caller must not believe a code was delivered");
    assert!(matches!(err, AuthError::MailError(_)));

    // The failed attempt is recorded with success = false.
    let recorded: (bool, String) = sqlx::query_as(
        "SELECT success, category FROM email_notifications ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_one(pool)
    .await
    .expect("read notification row");
    assert_eq!(recorded, (false, "email_verification".into()));

    test_db.stop().await;
}

#[tokio::test]
async fn full_password_reset_flow() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let mailer = MockMailer::new();
    common::seed_user(pool, "reset-flow@example.com", Some("old-password-1")).await;

    account::request_password_reset(pool, &mailer, "reset-flow@example.com")
        .await
        .expect("request reset");

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let token = MockMailer::extract_code_tag(&sent[0].html_body).expect("token in email");

    // Too-short replacement is rejected before the token is consumed.
    let err = account::reset_password(pool, &mailer, &token, "short")
        .await
        .expect_err("short password");
    assert!(matches!(err, AuthError::ValidationError(_)));

    // The token still works afterwards.
    account::reset_password(pool, &mailer, &token, "new-password-22")
        .await
        .expect("reset");

    let outcome = account::login(
        pool,
        &mailer,
        "reset-flow@example.com",
        "new-password-22",
        &ClientInfo::default(),
    )
    .await
    .expect("login with the new password");
    assert_eq!(outcome.user.email, "reset-flow@example.com");

    // Replay of the consumed token fails.
    let err = account::reset_password(pool, &mailer, &token, "another-pass-33")
        .await
        .expect_err("replay");
    assert!(matches!(err, AuthError::CredentialError));

    test_db.stop().await;
}

#[tokio::test]
async fn deletion_proceeds_when_the_notice_email_fails() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let mailer = MockMailer::failing();
    let user_id = common::seed_user(pool, "delete-me@example.com", Some("password123")).await;

    account::delete_account(pool, &mailer, &user_id)
        .await
        .expect("deletion must not be blocked by mail");

    assert!(
        queries::get_user_by_id(pool, &user_id)
            .await
            .expect("lookup")
            .is_none()
    );

    let recorded: (bool, String) = sqlx::query_as(
        "SELECT success, category FROM email_notifications ORDER BY created_at DESC LIMIT 1",
    )
    .fetch_one(pool)
    .await
    .expect("read notification row");
    assert_eq!(recorded, (false, "account_deleted".into()));

    test_db.stop().await;
}

#[tokio::test]
async fn dangling_session_surfaces_a_cleanup_directive() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "dangling@example.com", Some("password123")).await;

    let token = session::create(pool, &user_id).await.expect("session");

    // Live user: authenticated, nothing to clean up.
    let state = account::session_state(pool, Some(&token)).await.expect("state");
    assert!(state.authenticated);
    assert!(!state.cleanup_required);

    queries::delete_user(pool, &user_id).await.expect("delete user");

    // Same token now points at nothing: unauthenticated plus cleanup.
    let state = account::session_state(pool, Some(&token)).await.expect("state");
    assert!(!state.authenticated);
    assert!(state.user.is_none());
    assert!(state.cleanup_required);

    // Resolution stayed read-only: the stale row is still there.
    let resolved = session::resolve(pool, &token).await.expect("resolve");
    assert!(resolved.is_some());

    // Unknown tokens are merely unauthenticated, no cleanup.
    let state = account::session_state(pool, Some("no-such-token"))
        .await
        .expect("state");
    assert!(!state.authenticated);
    assert!(!state.cleanup_required);

    test_db.stop().await;
}

#[tokio::test]
async fn logout_drops_the_session() {
    let Some(test_db) = start_pg().await else { return };
    let pool = &test_db.pool;
    let user_id = common::seed_user(pool, "logout@example.com", Some("password123")).await;

    let token = session::create(pool, &user_id).await.expect("session");
    account::logout(pool, &token).await.expect("logout");

    let state = account::session_state(pool, Some(&token)).await.expect("state");
    assert!(!state.authenticated);
    assert!(!state.cleanup_required);

    test_db.stop().await;
}
