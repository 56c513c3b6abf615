//! Rendered subject/body pairs for each account email category.
//!
//! The account workflows treat these as opaque content production; nothing
//! here carries policy.

use crate::models::auth::OtpPurpose;

/// A rendered email ready for delivery.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub html_body: String,
}

fn greeting(name: Option<&str>) -> String {
    match name {
        Some(n) => format!("Hello {n},"),
        None => "Hello,".to_string(),
    }
}

/// OTP delivery email. The wording varies slightly by purpose so the
/// recipient knows what the code unlocks.
pub fn verification_code(
    name: Option<&str>,
    code: &str,
    purpose: OtpPurpose,
) -> RenderedEmail {
    let action = match purpose {
        OtpPurpose::EmailVerification => "verify your email address",
        OtpPurpose::ProfileChange => "confirm your profile change",
        OtpPurpose::AccountSecurity => "confirm this security action",
    };
    RenderedEmail {
        subject: "Your Tidelens verification code".to_string(),
        html_body: format!(
            "<p>{}</p>\
             <p>Use the following code to {action}:</p>\
             <p style=\"font-size:1.5em;letter-spacing:0.2em\"><strong>{code}</strong></p>\
             <p>This code expires in 10 minutes. If you did not request it, \
             you can ignore this email.</p>\
             <p>— The Tidelens team</p>",
            greeting(name),
        ),
    }
}

/// New sign-in alert.
pub fn login_alert(name: Option<&str>, ip_address: Option<&str>) -> RenderedEmail {
    let origin = match ip_address {
        Some(ip) => format!(" from {ip}"),
        None => String::new(),
    };
    RenderedEmail {
        subject: "New sign-in to your Tidelens account".to_string(),
        html_body: format!(
            "<p>{}</p>\
             <p>Your Tidelens account was just signed into{origin}.</p>\
             <p>If this was you, no action is needed. If not, reset your \
             password right away.</p>\
             <p>— The Tidelens team</p>",
            greeting(name),
        ),
    }
}

/// Password-reset request email carrying the reset token.
pub fn password_reset(name: Option<&str>, token: &str) -> RenderedEmail {
    RenderedEmail {
        subject: "Reset your Tidelens password".to_string(),
        html_body: format!(
            "<p>{}</p>\
             <p>A password reset was requested for your account. Use this \
             token to choose a new password:</p>\
             <p><code>{token}</code></p>\
             <p>The token expires in 1 hour and can be used once. If you did \
             not request a reset, ignore this email.</p>\
             <p>— The Tidelens team</p>",
            greeting(name),
        ),
    }
}

/// Confirmation sent after a password has been changed.
pub fn password_changed(name: Option<&str>) -> RenderedEmail {
    RenderedEmail {
        subject: "Your Tidelens password was changed".to_string(),
        html_body: format!(
            "<p>{}</p>\
             <p>The password for your Tidelens account was just changed.</p>\
             <p>If you did not do this, contact support immediately.</p>\
             <p>— The Tidelens team</p>",
            greeting(name),
        ),
    }
}

/// Account-deletion notice, sent while the account still exists.
pub fn account_deleted(name: Option<&str>) -> RenderedEmail {
    RenderedEmail {
        subject: "Your Tidelens account has been deleted".to_string(),
        html_body: format!(
            "<p>{}</p>\
             <p>Your Tidelens account and its data have been deleted as \
             requested. We're sorry to see you go.</p>\
             <p>— The Tidelens team</p>",
            greeting(name),
        ),
    }
}
