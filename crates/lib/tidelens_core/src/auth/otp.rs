//! One-time passcode issuance and validation.

use chrono::{Duration, Utc};
use rand::{Rng, rng};
use sqlx::PgPool;

use super::{AuthError, queries};
use crate::models::auth::OtpPurpose;

/// OTP lifetime from issuance.
const OTP_TTL_MINUTES: i64 = 10;

/// Fixed OTP code length.
const OTP_CODE_LEN: usize = 6;

/// Generate a fixed-length numeric code from the thread-local CSPRNG.
fn generate_code() -> String {
    let mut rng = rng();
    (0..OTP_CODE_LEN)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

/// Issue a new OTP for (user, purpose) and persist it with a 10-minute
/// expiry. Prior records for the same pair are not invalidated; validation
/// always targets the most recently issued one.
pub async fn issue(
    pool: &PgPool,
    user_id: &str,
    purpose: OtpPurpose,
) -> Result<String, AuthError> {
    let code = generate_code();
    let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);
    queries::create_otp(pool, user_id, purpose, &code, expires_at).await?;
    Ok(code)
}

/// Validate and consume an OTP. Returns false — never an error — when no
/// matching unconsumed record exists, the code is wrong, the record has
/// expired, or the purpose does not match. True is returned at most once
/// per record: the check-and-consume is a single conditional UPDATE.
pub async fn validate(
    pool: &PgPool,
    user_id: &str,
    code: &str,
    purpose: OtpPurpose,
) -> Result<bool, AuthError> {
    queries::consume_latest_otp(pool, user_id, purpose, code).await
}
