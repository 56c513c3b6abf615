//! Request and response bodies for the auth API.

use serde::{Deserialize, Serialize};
use tidelens_core::models::auth::{LoginAuditEntry, UserView};

/// Error body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Caller-facing user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBody {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
    pub profile_image_url: Option<String>,
}

impl From<UserView> for UserBody {
    fn from(v: UserView) -> Self {
        Self {
            id: v.id,
            email: v.email,
            name: v.name,
            email_verified: v.email_verified,
            profile_image_url: v.profile_image_url,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserBody,
}

/// Session state triple exposed to the transport layer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub authenticated: bool,
    pub user: Option<UserBody>,
    pub cleanup_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub purpose: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpVerifyRequest {
    pub purpose: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct OtpVerifyResponse {
    pub valid: bool,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryEntry {
    pub id: String,
    pub email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<LoginAuditEntry> for LoginHistoryEntry {
    fn from(e: LoginAuditEntry) -> Self {
        Self {
            id: e.id,
            email: e.email,
            ip_address: e.ip_address,
            user_agent: e.user_agent,
            success: e.success,
            failure_reason: e.failure_reason,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginHistoryResponse {
    pub attempts: Vec<LoginHistoryEntry>,
}
