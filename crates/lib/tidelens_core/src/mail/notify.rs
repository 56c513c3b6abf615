//! Notification side-effect coordinator.
//!
//! Attempts one delivery and appends exactly one notification record,
//! success or failure. The outcome is handed back as a value; the caller's
//! workflow decides whether a failed delivery matters. Nothing here ever
//! unwinds the caller.

use sqlx::PgPool;
use tracing::{error, warn};

use super::templates::RenderedEmail;
use super::{MailError, Mailer};
use crate::auth::queries;
use crate::models::auth::EmailCategory;

/// Send one account email and record the outcome.
///
/// The record insert is itself best-effort: if it fails, the failure is
/// logged and the delivery outcome is still returned unchanged.
pub async fn notify(
    pool: &PgPool,
    mailer: &dyn Mailer,
    user_id: Option<&str>,
    recipient: &str,
    category: EmailCategory,
    email: &RenderedEmail,
) -> Result<(), MailError> {
    let outcome = mailer
        .send(recipient, &email.subject, &email.html_body)
        .await;

    let (success, detail) = match &outcome {
        Ok(()) => (true, None),
        Err(e) => (false, Some(e.to_string())),
    };

    if let Err(e) = queries::append_email_record(
        pool,
        user_id,
        recipient,
        category,
        &email.subject,
        success,
        detail.as_deref(),
    )
    .await
    {
        error!(
            error = %e,
            recipient,
            category = category.as_str(),
            "failed to append email notification record"
        );
    }

    if let Err(e) = &outcome {
        warn!(
            error = %e,
            recipient,
            category = category.as_str(),
            "email delivery failed"
        );
    }

    outcome
}
