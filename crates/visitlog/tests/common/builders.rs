//! Builders for visit forms, photos and a wired-up pipeline.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use chrono::FixedOffset;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use visitlog::config::schema::default_product_catalog;
use visitlog::geolocation::ReportedPosition;
use visitlog::model::{ContactSelection, KnownContact, NewContact};
use visitlog::pipeline::NoopProgress;
use visitlog::{
    Directory, ImageNormalizer, NormalizedImage, PipelineConfig, PipelineServices, SessionCache,
    SessionService, SubmissionError, SubmissionPipeline, SubmissionReceipt, ValidationErrors,
    VisitForm,
};

use super::fakes::{MemoryRowStore, Recorder};

pub const REP: &str = "ravi.kumar@pw.live";
pub const PEER: &str = "priya.nair@pw.live";
pub const MANAGER: &str = "meera.iyer@pw.live";

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(330 * 60).unwrap()
}

/// Encodes a solid-colour PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 120, 200]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

pub fn photo() -> NormalizedImage {
    ImageNormalizer::new(1024, 1024, 0.7)
        .normalize(&png(64, 48))
        .unwrap()
}

pub fn pune() -> ReportedPosition {
    ReportedPosition::from_fields(Some(18.5204), Some(73.8567))
}

/// Fluent builder for [`VisitForm`].
pub struct FormBuilder {
    form: VisitForm,
}

impl FormBuilder {
    /// A complete form for the rep's first site with an existing contact.
    pub fn new() -> Self {
        let principal = KnownContact {
            name: "Anil Deshmukh".to_string(),
            designation: "Principal".to_string(),
            phone: "9876543210".to_string(),
            email: String::new(),
        };
        Self {
            form: VisitForm {
                school: "Kendriya Vidyalaya".to_string(),
                outcome: "Demo Conducted".to_string(),
                contact: Some(ContactSelection::Existing {
                    payload: principal.to_payload(),
                }),
                remarks: "Met the principal".to_string(),
                photo: Some(photo()),
                ..VisitForm::default()
            },
        }
    }

    pub fn district(mut self, district: &str) -> Self {
        self.form.district = district.to_string();
        self
    }

    pub fn school(mut self, school: &str) -> Self {
        self.form.school = school.to_string();
        self
    }

    pub fn outcome(mut self, outcome: &str) -> Self {
        self.form.outcome = outcome.to_string();
        self
    }

    pub fn skus(mut self, skus: &[&str]) -> Self {
        self.form.selected_skus = skus.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn new_contact(mut self, name: &str, designation: &str, phone: &str) -> Self {
        self.form.contact = Some(ContactSelection::New(NewContact {
            designation: designation.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            email: String::new(),
        }));
        self
    }

    pub fn contact_payload(mut self, payload: &str) -> Self {
        self.form.contact = Some(ContactSelection::Existing {
            payload: payload.to_string(),
        });
        self
    }

    pub fn co_visitors(mut self, first: &str, second: &str) -> Self {
        self.form.co_visitor1 = first.to_string();
        self.form.co_visitor2 = second.to_string();
        self
    }

    pub fn follow_up(mut self, local: &str) -> Self {
        self.form.follow_up = local.to_string();
        self
    }

    pub fn without_photo(mut self) -> Self {
        self.form.photo = None;
        self
    }

    pub fn build(self) -> VisitForm {
        self.form
    }
}

impl Default for FormBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Session service and pipeline over the in-memory fakes.
pub struct Harness {
    pub store: Arc<MemoryRowStore>,
    pub recorder: Arc<Recorder>,
    pub sessions: SessionService,
    pub pipeline: SubmissionPipeline,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(Some("visits@group.calendar.google.com"))
    }

    pub fn without_calendar() -> Self {
        Self::build(None)
    }

    fn build(calendar_id: Option<&str>) -> Self {
        let store = Arc::new(MemoryRowStore::team());
        let recorder = Arc::new(Recorder::with_address("MG Road, Pune, Maharashtra"));

        let directory = Directory::new(store.clone(), default_product_catalog());
        let sessions = SessionService::new(directory, "@pw.live");

        let config = PipelineConfig {
            id_prefix: "K25LVT".to_string(),
            local_offset: ist(),
            spreadsheet_id: "sheet-1".to_string(),
            sheet_tab: "Form Responses".to_string(),
            image_folder_id: "folder-1".to_string(),
            calendar_id: calendar_id.map(str::to_string),
        };
        let services = PipelineServices {
            row_store: store.clone(),
            files: recorder.clone(),
            sheets: recorder.clone(),
            geocoder: recorder.clone(),
            calendar: recorder.clone(),
            mailer: recorder.clone(),
        };
        let pipeline = SubmissionPipeline::new(Arc::new(config), services);

        Self {
            store,
            recorder,
            sessions,
            pipeline,
        }
    }

    pub async fn login(&self, email: &str) -> SessionCache {
        self.sessions.start(email, &pune()).await.unwrap()
    }

    /// Validates `form` against `session` and submits it.
    pub async fn submit(
        &self,
        session: &SessionCache,
        form: VisitForm,
    ) -> Result<Result<SubmissionReceipt, SubmissionError>, ValidationErrors> {
        let draft = form.validate(session, ist())?;
        Ok(self.pipeline.submit(draft, &NoopProgress).await)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
