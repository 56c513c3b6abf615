//! # tidelens_api
//!
//! HTTP API library for Tidelens.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use sqlx::PgPool;
use tidelens_core::mail::Mailer;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{account, auth};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Outbound mailer.
    pub mailer: Arc<dyn Mailer>,
}

/// Run embedded database migrations.
///
/// Delegates to `tidelens_core::migrate::migrate()` which owns the
/// migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    tidelens_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no session required)
    let public = Router::new()
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/session", get(auth::session_handler))
        .route("/auth/password/forgot", post(auth::forgot_password_handler))
        .route("/auth/password/reset", post(auth::reset_password_handler));

    // Protected routes (require a live session)
    let protected = Router::new()
        .route("/auth/otp/request", post(account::request_otp_handler))
        .route("/auth/otp/verify", post(account::verify_otp_handler))
        .route("/auth/login-history", get(account::login_history_handler))
        .route("/auth/account", delete(account::delete_account_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_session,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
