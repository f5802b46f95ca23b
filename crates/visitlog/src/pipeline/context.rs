use chrono::{DateTime, Utc};

use crate::model::VisitDraft;

use super::error::StageWarning;

pub struct SubmissionContext {
    // Input
    pub draft: VisitDraft,

    // Stage 1 result
    pub submission_id: String,
    pub started_at: DateTime<Utc>,

    // Degraded and best-effort outcomes
    pub warnings: Vec<StageWarning>,
}

impl SubmissionContext {
    pub fn new(draft: VisitDraft, submission_id: String, started_at: DateTime<Utc>) -> Self {
        Self {
            draft,
            submission_id,
            started_at,
            warnings: Vec::new(),
        }
    }
}
