//! Account and authentication domain models.
//!
//! These are internal domain models; the API crate maps them onto its
//! wire-format response bodies.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
    pub profile_image_url: Option<String>,
}

/// User with password hash (for internal auth flows).
#[derive(Debug, Clone)]
pub struct UserWithPassword {
    pub user: User,
    pub password_hash: Option<String>,
}

/// Caller-facing user projection. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub email_verified: bool,
    pub profile_image_url: Option<String>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            email_verified: u.email_verified,
            profile_image_url: u.profile_image_url,
        }
    }
}

/// Purpose an OTP code is scoped to.
///
/// Closed set — unknown purpose strings are rejected at the transport
/// boundary before reaching the OTP manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPurpose {
    EmailVerification,
    ProfileChange,
    AccountSecurity,
}

impl OtpPurpose {
    pub fn as_str(self) -> &'static str {
        match self {
            OtpPurpose::EmailVerification => "email_verification",
            OtpPurpose::ProfileChange => "profile_change",
            OtpPurpose::AccountSecurity => "account_security",
        }
    }
}

impl FromStr for OtpPurpose {
    type Err = UnknownPurpose;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email_verification" => Ok(OtpPurpose::EmailVerification),
            "profile_change" => Ok(OtpPurpose::ProfileChange),
            "account_security" => Ok(OtpPurpose::AccountSecurity),
            _ => Err(UnknownPurpose),
        }
    }
}

impl fmt::Display for OtpPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for purpose strings outside the closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownPurpose;

/// Fixed vocabulary for audited login failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailureReason {
    MissingCredentials,
    UserNotFound,
    NoPasswordSet,
    InvalidPassword,
}

impl LoginFailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginFailureReason::MissingCredentials => "missing_credentials",
            LoginFailureReason::UserNotFound => "user_not_found",
            LoginFailureReason::NoPasswordSet => "no_password_set",
            LoginFailureReason::InvalidPassword => "invalid_password",
        }
    }
}

/// Category tag for outbound account emails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailCategory {
    EmailVerification,
    LoginAlert,
    PasswordReset,
    PasswordChanged,
    AccountDeleted,
}

impl EmailCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailCategory::EmailVerification => "email_verification",
            EmailCategory::LoginAlert => "login_alert",
            EmailCategory::PasswordReset => "password_reset",
            EmailCategory::PasswordChanged => "password_changed",
            EmailCategory::AccountDeleted => "account_deleted",
        }
    }
}

/// One login attempt, audited regardless of outcome.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    pub user_id: Option<String>,
    /// Email exactly as typed by the caller.
    pub email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<LoginFailureReason>,
}

/// A login audit row read back from the store.
#[derive(Debug, Clone, Serialize)]
pub struct LoginAuditEntry {
    pub id: String,
    pub email: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub success: bool,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Session state exposed to the transport layer.
///
/// `cleanup_required` is true when the token resolved to a session whose
/// user no longer exists; the transport must discard the stored token.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub authenticated: bool,
    pub user: Option<UserView>,
    pub cleanup_required: bool,
}

impl SessionState {
    /// State for a missing or unknown session token.
    pub fn unauthenticated() -> Self {
        Self {
            authenticated: false,
            user: None,
            cleanup_required: false,
        }
    }
}
