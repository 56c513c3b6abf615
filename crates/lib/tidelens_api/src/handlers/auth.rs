//! Authentication request handlers: login/logout, session state, and the
//! password-reset pair.

use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use axum_extra::extract::cookie::CookieJar;
use tidelens_core::account;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, OkResponse, ResetPasswordRequest,
    SessionResponse,
};
use crate::services::{client, cookies};

/// `POST /auth/login` — authenticate with email + password and set the
/// session cookie.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<LoginResponse>)> {
    let info = client::client_info(&headers);
    let outcome = account::login(
        &state.pool,
        state.mailer.as_ref(),
        &body.email,
        &body.password,
        &info,
    )
    .await?;

    let jar = jar.add(cookies::session_cookie(
        &outcome.session_token,
        state.config.secure_cookies,
    ));
    Ok((
        jar,
        Json(LoginResponse {
            user: outcome.user.into(),
        }),
    ))
}

/// `POST /auth/logout` — drop the session and clear the cookie.
pub async fn logout_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<OkResponse>)> {
    if let Some(cookie) = jar.get(cookies::SESSION_COOKIE) {
        account::logout(&state.pool, cookie.value()).await?;
    }
    let jar = jar.add(cookies::clear_session_cookie(state.config.secure_cookies));
    Ok((jar, Json(OkResponse { success: true })))
}

/// `GET /auth/session` — report session state.
///
/// When the session points at a user that no longer exists, the response
/// both says so (`cleanupRequired`) and clears the stale cookie.
pub async fn session_handler(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<SessionResponse>)> {
    let token = jar
        .get(cookies::SESSION_COOKIE)
        .map(|c| c.value().to_string());

    let session = account::session_state(&state.pool, token.as_deref()).await?;

    let jar = if session.cleanup_required {
        jar.add(cookies::clear_session_cookie(state.config.secure_cookies))
    } else {
        jar
    };

    Ok((
        jar,
        Json(SessionResponse {
            authenticated: session.authenticated,
            user: session.user.map(Into::into),
            cleanup_required: session.cleanup_required,
        }),
    ))
}

/// `POST /auth/password/forgot` — create a reset token and email it.
pub async fn forgot_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> AppResult<Json<OkResponse>> {
    account::request_password_reset(&state.pool, state.mailer.as_ref(), &body.email).await?;
    Ok(Json(OkResponse { success: true }))
}

/// `POST /auth/password/reset` — consume a reset token and set the new
/// password.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> AppResult<Json<OkResponse>> {
    account::reset_password(
        &state.pool,
        state.mailer.as_ref(),
        &body.token,
        &body.new_password,
    )
    .await?;
    Ok(Json(OkResponse { success: true }))
}
