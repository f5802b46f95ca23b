use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info_span, Instrument};

use crate::imaging::{NormalizedImage, JPEG_MIME};
use crate::model::{ContactSnapshot, Coordinates, Resolved, VisitDraft, VisitRecord};
use crate::services::{
    CalendarScheduler, FileStorage, Geocoder, Mailer, RowStore, ServiceError, SheetAppender,
};

use super::config::PipelineConfig;
use super::context::SubmissionContext;
use super::error::{StageWarning, SubmissionError};
use super::id::SubmissionIdGenerator;
use super::notify::{follow_up_reminder, ConfirmationEmail};
use super::progress::{ProgressEvent, ProgressReporter, SubmissionStage};
use super::row::sheet_row;
use super::{ADDRESS_LOOKUP_FAILED, ADDRESS_NOT_FOUND, IMAGE_NOT_PROVIDED, IMAGE_UPLOAD_FAILED};

/// External collaborators of the pipeline.
#[derive(Clone)]
pub struct PipelineServices {
    pub row_store: Arc<dyn RowStore>,
    pub files: Arc<dyn FileStorage>,
    pub sheets: Arc<dyn SheetAppender>,
    pub geocoder: Arc<dyn Geocoder>,
    pub calendar: Arc<dyn CalendarScheduler>,
    pub mailer: Arc<dyn Mailer>,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub submission_id: String,
    pub address: Resolved<String>,
    pub photo_url: Resolved<String>,
    pub follow_up_scheduled: bool,
    pub warnings: Vec<StageWarning>,
}

pub struct SubmissionPipeline {
    config: Arc<PipelineConfig>,
    services: PipelineServices,
    ids: SubmissionIdGenerator,
}

impl SubmissionPipeline {
    pub fn new(config: Arc<PipelineConfig>, services: PipelineServices) -> Self {
        let ids = SubmissionIdGenerator::new(config.id_prefix.clone());
        Self {
            config,
            services,
            ids,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage for one draft. Only contact resolution and
    /// persistence can fail the submission; everything after persistence is
    /// best-effort.
    pub async fn submit(
        &self,
        draft: VisitDraft,
        progress: &dyn ProgressReporter,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        // Stage 1: Identifier
        report(progress, SubmissionStage::Identifier);
        let started_at = Utc::now();
        let submission_id = self.ids.next_at(started_at);
        let span = info_span!("submission", submission_id = %submission_id);

        let ctx = SubmissionContext::new(draft, submission_id, started_at);
        self.run(ctx, progress).instrument(span).await
    }

    async fn run(
        &self,
        mut ctx: SubmissionContext,
        progress: &dyn ProgressReporter,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        // Stage 2: Contact
        report(progress, SubmissionStage::Contact);
        let contact = match self.step_resolve_contact(&ctx) {
            Ok(contact) => contact,
            Err(e) => return Err(fail(progress, SubmissionStage::Contact, e)),
        };

        // Stage 3: Address
        report(progress, SubmissionStage::Address);
        let address = self
            .step_resolve_address(ctx.draft.coordinates)
            .instrument(info_span!("resolve_address"))
            .await;
        if let Resolved::Degraded {
            placeholder,
            reason,
        } = &address
        {
            ctx.warnings.push(StageWarning::Address {
                placeholder: *placeholder,
                reason: reason.clone(),
            });
        }

        // Stage 4: Photo
        report(progress, SubmissionStage::Photo);
        let photo_url = self
            .step_upload_photo(&ctx.submission_id, ctx.draft.photo.as_ref())
            .instrument(info_span!("upload_photo"))
            .await;
        if let Resolved::Degraded {
            placeholder,
            reason,
        } = &photo_url
        {
            ctx.warnings.push(StageWarning::Photo {
                placeholder: *placeholder,
                reason: reason.clone(),
            });
        }

        // Stage 5: Persistence
        report(progress, SubmissionStage::Persistence);
        let record = build_record(&ctx, contact, address, photo_url);
        if let Err(e) = self
            .services
            .row_store
            .save_visit(&record)
            .instrument(info_span!("persist"))
            .await
        {
            return Err(fail(
                progress,
                SubmissionStage::Persistence,
                SubmissionError::Persistence(e),
            ));
        }
        log::info!(
            "Saved visit {} for {} at {}",
            record.submission_id,
            record.user_email,
            record.school
        );

        // Stage 6: Mirror
        report(progress, SubmissionStage::Mirror);
        if let Err(e) = self
            .step_mirror(&record)
            .instrument(info_span!("mirror"))
            .await
        {
            log::warn!("Failed to mirror {} to the sheet: {}", record.submission_id, e);
            ctx.warnings.push(StageWarning::Mirror {
                error: e.to_string(),
            });
        }

        // Stage 7: Follow-up
        report(progress, SubmissionStage::FollowUp);
        let follow_up_scheduled = match self
            .step_schedule_follow_up(&record)
            .instrument(info_span!("follow_up"))
            .await
        {
            Ok(scheduled) => scheduled,
            Err(e) => {
                log::warn!(
                    "Could not create calendar invitation for {}: {}",
                    record.submission_id,
                    e
                );
                ctx.warnings.push(StageWarning::Calendar {
                    error: e.to_string(),
                });
                false
            }
        };

        // Stage 8: Notification
        report(progress, SubmissionStage::Notification);
        let email = ConfirmationEmail::render(&record, self.config.local_offset);
        if let Err(e) = self
            .services
            .mailer
            .send(&email.to, &email.subject, &email.html_body)
            .instrument(info_span!("notify"))
            .await
        {
            log::warn!(
                "Error sending confirmation email for {}: {}",
                record.submission_id,
                e
            );
            ctx.warnings.push(StageWarning::Mail {
                error: e.to_string(),
            });
        }

        progress.report(ProgressEvent::Completed {
            submission_id: record.submission_id.clone(),
            warnings: ctx.warnings.len(),
        });

        Ok(SubmissionReceipt {
            submission_id: record.submission_id,
            address: record.address,
            photo_url: record.photo_url,
            follow_up_scheduled,
            warnings: ctx.warnings,
        })
    }

    fn step_resolve_contact(&self, ctx: &SubmissionContext) -> Result<ContactSnapshot, SubmissionError> {
        ctx.draft
            .contact
            .resolve()
            .map_err(|e| SubmissionError::MalformedContact(e.to_string()))
    }

    async fn step_resolve_address(&self, coordinates: Option<Coordinates>) -> Resolved<String> {
        let Some(coordinates) = coordinates else {
            return Resolved::absent(ADDRESS_NOT_FOUND);
        };

        match self.services.geocoder.reverse_geocode(coordinates).await {
            Ok(Some(address)) if !address.trim().is_empty() => Resolved::Ok(address),
            Ok(_) => Resolved::absent(ADDRESS_NOT_FOUND),
            Err(e) => {
                log::warn!("Reverse geocoding failed: {}", e);
                Resolved::degraded(ADDRESS_LOOKUP_FAILED, e.to_string())
            }
        }
    }

    async fn step_upload_photo(
        &self,
        submission_id: &str,
        photo: Option<&NormalizedImage>,
    ) -> Resolved<String> {
        let Some(photo) = photo else {
            return Resolved::absent(IMAGE_NOT_PROVIDED);
        };

        match self.store_photo(submission_id, photo).await {
            Ok(link) => Resolved::Ok(link),
            Err(e) => {
                log::warn!("Photo upload for {} failed: {}", submission_id, e);
                Resolved::degraded(IMAGE_UPLOAD_FAILED, e.to_string())
            }
        }
    }

    async fn store_photo(
        &self,
        submission_id: &str,
        photo: &NormalizedImage,
    ) -> Result<String, ServiceError> {
        let files = &self.services.files;
        let name = photo_file_name(submission_id, Utc::now());

        let file_id = files
            .create_file(&name, &self.config.image_folder_id, JPEG_MIME)
            .await?;
        files.write_content(&file_id, &photo.bytes, JPEG_MIME).await?;
        if let Err(e) = files.set_public_readable(&file_id).await {
            log::warn!("Could not make photo {} public: {}", file_id, e);
        }
        files.get_shareable_link(&file_id).await
    }

    async fn step_mirror(&self, record: &VisitRecord) -> Result<(), ServiceError> {
        let row = sheet_row(record, self.config.local_offset);
        self.services
            .sheets
            .append_row(&self.config.spreadsheet_id, &self.config.sheet_tab, row)
            .await
    }

    /// `Ok(false)` when there is no follow-up or no calendar configured.
    async fn step_schedule_follow_up(&self, record: &VisitRecord) -> Result<bool, ServiceError> {
        let Some(calendar_id) = self.config.calendar_id.as_deref() else {
            return Ok(false);
        };
        let Some(reminder) = follow_up_reminder(record, self.config.local_offset) else {
            return Ok(false);
        };

        self.services.calendar.schedule(calendar_id, &reminder).await?;
        Ok(true)
    }
}

fn report(progress: &dyn ProgressReporter, stage: SubmissionStage) {
    progress.report(ProgressEvent::Stage {
        stage,
        message: stage.message().to_string(),
    });
}

fn fail(
    progress: &dyn ProgressReporter,
    stage: SubmissionStage,
    error: SubmissionError,
) -> SubmissionError {
    log::error!("Submission failed at {:?}: {}", stage, error);
    progress.report(ProgressEvent::Failed {
        stage,
        error: error.to_string(),
    });
    error
}

pub(crate) fn photo_file_name(submission_id: &str, now: DateTime<Utc>) -> String {
    format!("visit_{}_{}.jpg", submission_id, now.timestamp_millis())
}

fn build_record(
    ctx: &SubmissionContext,
    contact: ContactSnapshot,
    address: Resolved<String>,
    photo_url: Resolved<String>,
) -> VisitRecord {
    let draft = &ctx.draft;
    VisitRecord {
        submission_id: ctx.submission_id.clone(),
        submitted_at: ctx.started_at,
        user_email: draft.user_email.clone(),
        rm_email: draft.rm_email.clone(),
        zm_email: draft.zm_email.clone(),
        state: draft.state.clone(),
        district: draft.district.clone(),
        school: draft.school.clone(),
        outcome: draft.outcome.clone(),
        selected_skus: draft.selected_skus.clone(),
        contact,
        co_visitors: draft.co_visitors.clone(),
        remarks: draft.remarks.clone(),
        coordinates: draft.coordinates,
        address,
        photo_url,
        follow_up: draft.follow_up,
    }
}
