pub mod config;
pub mod context;
pub mod error;
pub mod id;
pub mod notify;
pub mod progress;
pub mod row;
pub mod runner;

pub use config::PipelineConfig;
pub use context::SubmissionContext;
pub use error::{StageWarning, SubmissionError};
pub use id::SubmissionIdGenerator;
pub use notify::{follow_up_reminder, ConfirmationEmail};
pub use progress::{LogProgress, NoopProgress, ProgressEvent, ProgressReporter, SubmissionStage};
pub use row::sheet_row;
pub use runner::{PipelineServices, SubmissionPipeline, SubmissionReceipt};

/// Shown to the user after a successful submission.
pub const SUCCESS_MESSAGE: &str =
    "Thank you for logging your visit! A confirmation email has been sent.";

pub const ADDRESS_NOT_FOUND: &str = "Address not found";
pub const ADDRESS_LOOKUP_FAILED: &str = "Could not reverse geocode";
pub const IMAGE_NOT_PROVIDED: &str = "Image Not Provided";
pub const IMAGE_UPLOAD_FAILED: &str = "Image Processing Failed";
