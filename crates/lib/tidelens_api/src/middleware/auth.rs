//! Session middleware — resolves the session cookie and injects the
//! current user into request extensions.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tidelens_core::account;
use tidelens_core::models::auth::UserView;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::SESSION_COOKIE;

/// The authenticated user stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserView);

/// Axum middleware: resolves the session cookie and rejects the request
/// when it does not map to a live user. A session pointing at a deleted
/// user is unauthenticated here too; the cookie cleanup directive is
/// surfaced by the public session endpoint.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let jar = CookieJar::from_headers(request.headers());
    let token = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());

    let session = account::session_state(&state.pool, token.as_deref()).await?;

    let Some(user) = session.user.filter(|_| session.authenticated) else {
        return Err(AppError::Unauthorized("Not authenticated".into()));
    };

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
