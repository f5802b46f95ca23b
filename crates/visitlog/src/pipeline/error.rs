use thiserror::Error;

use crate::services::ServiceError;

/// Failures that abort a submission. Nothing has been persisted when one is
/// returned.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("Selected SPOC could not be read: {0}")]
    MalformedContact(String),

    #[error("Failed to save visit data: {0}")]
    Persistence(#[source] ServiceError),
}

impl SubmissionError {
    /// Message shown to the user; never carries API detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmissionError::MalformedContact(_) => {
                "The selected SPOC could not be read. Please select the SPOC again."
            }
            SubmissionError::Persistence(_) => {
                "Your visit could not be saved. Please try submitting again."
            }
        }
    }
}

/// Something that went wrong without failing the submission. Logged and
/// kept on the receipt for the caller's diagnostics; not meant for end users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageWarning {
    Address {
        placeholder: &'static str,
        reason: Option<String>,
    },
    Photo {
        placeholder: &'static str,
        reason: Option<String>,
    },
    Mirror {
        error: String,
    },
    Calendar {
        error: String,
    },
    Mail {
        error: String,
    },
}
