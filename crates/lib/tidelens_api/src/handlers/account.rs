//! Account handlers behind the session middleware: OTP request/verify,
//! login history, and account deletion.

use axum::Json;
use axum::extract::State;
use axum::Extension;
use axum_extra::extract::cookie::CookieJar;
use tidelens_core::account;
use tidelens_core::models::auth::OtpPurpose;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::{
    LoginHistoryResponse, OkResponse, OtpRequest, OtpVerifyRequest, OtpVerifyResponse,
};
use crate::services::cookies;

fn parse_purpose(raw: &str) -> AppResult<OtpPurpose> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("Unknown OTP purpose: {raw}")))
}

/// `POST /auth/otp/request` — issue an OTP for the current user and email
/// it. A failed delivery fails the request.
pub async fn request_otp_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<OtpRequest>,
) -> AppResult<Json<OkResponse>> {
    let purpose = parse_purpose(&body.purpose)?;
    account::request_otp(&state.pool, state.mailer.as_ref(), &current.0.id, purpose).await?;
    Ok(Json(OkResponse { success: true }))
}

/// `POST /auth/otp/verify` — validate (and consume) an OTP for the current
/// user. An invalid code is a `valid: false` response, not an error.
pub async fn verify_otp_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(body): Json<OtpVerifyRequest>,
) -> AppResult<Json<OtpVerifyResponse>> {
    let purpose = parse_purpose(&body.purpose)?;
    let valid = account::verify_otp(&state.pool, &current.0.id, &body.code, purpose).await?;
    Ok(Json(OtpVerifyResponse { valid }))
}

/// `GET /auth/login-history` — recent login attempts for the current user.
pub async fn login_history_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> AppResult<Json<LoginHistoryResponse>> {
    let attempts = account::login_history(&state.pool, &current.0.id).await?;
    Ok(Json(LoginHistoryResponse {
        attempts: attempts.into_iter().map(Into::into).collect(),
    }))
}

/// `DELETE /auth/account` — delete the current user's account and clear
/// the session cookie. Deletion proceeds even when the notice email fails.
pub async fn delete_account_handler(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<OkResponse>)> {
    account::delete_account(&state.pool, state.mailer.as_ref(), &current.0.id).await?;

    if let Some(cookie) = jar.get(cookies::SESSION_COOKIE) {
        let token = cookie.value().to_string();
        account::logout(&state.pool, &token).await?;
    }
    let jar = jar.add(cookies::clear_session_cookie(state.config.secure_cookies));

    Ok((jar, Json(OkResponse { success: true })))
}
