//! Clients for the external collaborators of the submission pipeline.
//!
//! Each collaborator is a trait so the pipeline, directory and session can
//! be exercised against in-memory fakes; the HTTP implementations talk to a
//! PostgREST row store and the Google Drive, Sheets, Calendar and Geocoding
//! APIs.

pub mod calendar;
pub mod drive;
pub mod error;
pub mod geocode;
pub mod http;
pub mod mail;
pub mod rowstore;
pub mod sheets;

use async_trait::async_trait;

use crate::model::{Coordinates, Identity, Site, VisitRecord};

pub use calendar::{FollowUpReminder, GoogleCalendar};
pub use drive::DriveStorage;
pub use error::{Result, ServiceError};
pub use geocode::MapsGeocoder;
pub use http::build_client;
pub use mail::LogMailer;
pub use rowstore::PostgrestRowStore;
pub use sheets::SheetsAppender;

/// Identity, site and visit tables.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// The active identity with this (lower-cased) e-mail, if any.
    async fn find_active_identity(&self, email: &str) -> Result<Option<Identity>>;

    /// Active identities sharing `zonal_manager_email`, minus `exclude`.
    async fn list_peers(&self, zonal_manager_email: &str, exclude: &str) -> Result<Vec<Identity>>;

    /// Active identities whose reporting manager is `email`.
    async fn list_direct_reports(&self, email: &str) -> Result<Vec<Identity>>;

    async fn list_sites(&self, email: &str, district: Option<&str>) -> Result<Vec<Site>>;

    /// District of every active site assigned to `email`, duplicates included.
    async fn list_districts(&self, email: &str) -> Result<Vec<String>>;

    async fn save_visit(&self, record: &VisitRecord) -> Result<()>;
}

/// Photo storage.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Creates an empty file and returns its id.
    async fn create_file(&self, name: &str, parent_folder: &str, mime_type: &str) -> Result<String>;

    async fn write_content(&self, file_id: &str, bytes: &[u8], mime_type: &str) -> Result<()>;

    async fn set_public_readable(&self, file_id: &str) -> Result<()>;

    async fn get_shareable_link(&self, file_id: &str) -> Result<String>;
}

/// Spreadsheet mirror of the row store.
#[async_trait]
pub trait SheetAppender: Send + Sync {
    async fn append_row(&self, spreadsheet_id: &str, tab: &str, row: Vec<String>) -> Result<()>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Human-readable address for `coordinates`; `None` when there is no match.
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<String>>;
}

#[async_trait]
pub trait CalendarScheduler: Send + Sync {
    async fn schedule(&self, calendar_id: &str, reminder: &FollowUpReminder) -> Result<()>;
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()>;
}
