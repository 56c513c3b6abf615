//! Client metadata extraction for the audit trail.

use axum::http::HeaderMap;
use axum::http::header::USER_AGENT;
use tidelens_core::account::ClientInfo;

/// Build `ClientInfo` from request headers.
///
/// The source address comes from `X-Forwarded-For` (first hop) — the app
/// runs behind a reverse proxy; without the header no address is recorded.
pub fn client_info(headers: &HeaderMap) -> ClientInfo {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    ClientInfo {
        ip_address,
        user_agent,
    }
}
