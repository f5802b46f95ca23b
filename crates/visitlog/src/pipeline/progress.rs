use serde::Serialize;

/// The eight submission stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStage {
    Identifier,
    Contact,
    Address,
    Photo,
    Persistence,
    Mirror,
    FollowUp,
    Notification,
}

impl SubmissionStage {
    pub fn message(&self) -> &'static str {
        match self {
            SubmissionStage::Identifier => "Generating submission ID...",
            SubmissionStage::Contact => "Reading SPOC details...",
            SubmissionStage::Address => "Resolving address...",
            SubmissionStage::Photo => "Uploading photo...",
            SubmissionStage::Persistence => "Saving visit...",
            SubmissionStage::Mirror => "Updating response sheet...",
            SubmissionStage::FollowUp => "Scheduling follow-up...",
            SubmissionStage::Notification => "Sending confirmation email...",
        }
    }
}

/// Events emitted while a submission runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Stage {
        stage: SubmissionStage,
        message: String,
    },
    Completed {
        submission_id: String,
        warnings: usize,
    },
    Failed {
        stage: SubmissionStage,
        error: String,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Writes progress to the log, tagged with the requester.
pub struct LogProgress {
    requester: String,
}

impl LogProgress {
    pub fn new(requester: impl Into<String>) -> Self {
        Self {
            requester: requester.into(),
        }
    }
}

impl ProgressReporter for LogProgress {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Stage { stage, message } => {
                log::debug!("[{}] {:?}: {}", self.requester, stage, message);
            }
            ProgressEvent::Completed {
                submission_id,
                warnings,
            } => {
                log::info!(
                    "[{}] Submission {} completed ({} warnings)",
                    self.requester,
                    submission_id,
                    warnings
                );
            }
            ProgressEvent::Failed { stage, error } => {
                log::warn!("[{}] Submission failed at {:?}: {}", self.requester, stage, error);
            }
        }
    }
}
