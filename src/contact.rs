//! Visitor contact form submissions.

use serde::{Deserialize, Serialize};

use crate::content::validation::is_valid_email;
use crate::error::{CmsError, CmsResult};

/// Shortest message accepted from the contact form.
pub const MIN_MESSAGE_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// Trim and check a submission. Accepted submissions are only logged.
pub fn submit_contact(submission: ContactSubmission) -> CmsResult<ContactSubmission> {
    let submission = ContactSubmission {
        name: submission.name.trim().to_string(),
        email: submission.email.trim().to_string(),
        message: submission.message.trim().to_string(),
    };

    if submission.name.is_empty() || submission.email.is_empty() || submission.message.is_empty() {
        return Err(CmsError::validation("All fields are required."));
    }
    if !is_valid_email(&submission.email) {
        return Err(CmsError::validation("Invalid email address."));
    }
    if submission.message.chars().count() < MIN_MESSAGE_LEN {
        return Err(CmsError::validation(format!(
            "Message must be at least {MIN_MESSAGE_LEN} characters."
        )));
    }

    tracing::info!(
        name = %submission.name,
        email = %submission.email,
        length = submission.message.len(),
        "Contact form submitted"
    );
    Ok(submission)
}
