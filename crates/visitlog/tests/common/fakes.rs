//! In-memory stand-ins for the row store and the external services.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use visitlog::model::{Identity, KnownContact, Site, VisitRecord};
use visitlog::services::{
    CalendarScheduler, FileStorage, FollowUpReminder, Geocoder, Mailer, Result, RowStore,
    ServiceError, SheetAppender,
};
use visitlog::Coordinates;

fn unavailable(service: &'static str) -> ServiceError {
    ServiceError::Status {
        service,
        status: 503,
        body: "unavailable".to_string(),
    }
}

pub fn identity(email: &str, rm: &str, zm: &str, status: &str) -> Identity {
    Identity {
        email: email.to_string(),
        reporting_manager_email: rm.to_string(),
        zonal_manager_email: zm.to_string(),
        status: status.to_string(),
    }
}

pub fn site(name: &str, district: &str, contacts: &[(&str, &str)]) -> Site {
    Site {
        name: name.to_string(),
        district: district.to_string(),
        state: "Maharashtra".to_string(),
        contacts: contacts
            .iter()
            .map(|(name, designation)| KnownContact {
                name: name.to_string(),
                designation: designation.to_string(),
                phone: "9876543210".to_string(),
                email: String::new(),
            })
            .collect(),
    }
}

/// Identity and site tables held in memory.
pub struct MemoryRowStore {
    pub identities: Vec<Identity>,
    /// (owner e-mail, site)
    pub sites: Vec<(String, Site)>,
    pub saved: Mutex<Vec<VisitRecord>>,
    pub fail_saves: AtomicBool,
}

impl MemoryRowStore {
    /// A zonal team: two field reps and their manager, plus an inactive rep.
    pub fn team() -> Self {
        let rep = "ravi.kumar@pw.live";
        let manager = "meera.iyer@pw.live";
        Self {
            identities: vec![
                identity(rep, manager, "zonal@pw.live", "Active"),
                identity("priya.nair@pw.live", manager, "zonal@pw.live", "Active"),
                identity(manager, "head@pw.live", "zonal@pw.live", "Active"),
                identity("gone@pw.live", manager, "zonal@pw.live", "Inactive"),
            ],
            sites: vec![
                (
                    rep.to_string(),
                    site("Kendriya Vidyalaya", "Pune", &[("Anil Deshmukh", "Principal")]),
                ),
                (rep.to_string(), site("Delhi Public School", "Pune", &[])),
                (
                    manager.to_string(),
                    site("Sahyadri School", "Satara", &[("Kavita Rane", "HOD")]),
                ),
                (manager.to_string(), site("Orchid High", "Pune", &[])),
                (manager.to_string(), site("Mount Carmel", "Satara", &[])),
            ],
            saved: Mutex::new(Vec::new()),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn saved(&self) -> Vec<VisitRecord> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn find_active_identity(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self
            .identities
            .iter()
            .find(|i| i.email == email && i.is_active())
            .cloned())
    }

    async fn list_peers(&self, zonal_manager_email: &str, exclude: &str) -> Result<Vec<Identity>> {
        Ok(self
            .identities
            .iter()
            .filter(|i| {
                i.zonal_manager_email == zonal_manager_email && i.email != exclude && i.is_active()
            })
            .cloned()
            .collect())
    }

    async fn list_direct_reports(&self, email: &str) -> Result<Vec<Identity>> {
        Ok(self
            .identities
            .iter()
            .filter(|i| i.reporting_manager_email == email && i.is_active())
            .cloned()
            .collect())
    }

    async fn list_sites(&self, email: &str, district: Option<&str>) -> Result<Vec<Site>> {
        Ok(self
            .sites
            .iter()
            .filter(|(owner, site)| owner == email && district.map_or(true, |d| site.district == d))
            .map(|(_, site)| site.clone())
            .collect())
    }

    async fn list_districts(&self, email: &str) -> Result<Vec<String>> {
        Ok(self
            .sites
            .iter()
            .filter(|(owner, _)| owner == email)
            .map(|(_, site)| site.district.clone())
            .collect())
    }

    async fn save_visit(&self, record: &VisitRecord) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(unavailable("row store"));
        }
        self.saved.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Records every call to the drive, sheet, geocoder, calendar and mailer.
#[derive(Default)]
pub struct Recorder {
    pub address: Mutex<Option<String>>,
    pub geocode_fails: AtomicBool,
    pub upload_fails: AtomicBool,
    pub sheet_fails: AtomicBool,
    pub mail_fails: AtomicBool,

    pub created_files: Mutex<Vec<(String, String)>>,
    pub uploaded_bytes: Mutex<Vec<usize>>,
    pub public_files: Mutex<Vec<String>>,
    pub rows: Mutex<Vec<(String, String, Vec<String>)>>,
    pub reminders: Mutex<Vec<(String, FollowUpReminder)>>,
    pub mails: Mutex<Vec<(String, String, String)>>,
}

impl Recorder {
    pub fn with_address(address: &str) -> Self {
        let recorder = Self::default();
        *recorder.address.lock().unwrap() = Some(address.to_string());
        recorder
    }
}

#[async_trait]
impl FileStorage for Recorder {
    async fn create_file(&self, name: &str, parent_folder: &str, _mime: &str) -> Result<String> {
        if self.upload_fails.load(Ordering::SeqCst) {
            return Err(unavailable("drive"));
        }
        let mut files = self.created_files.lock().unwrap();
        files.push((name.to_string(), parent_folder.to_string()));
        Ok(format!("file-{}", files.len()))
    }

    async fn write_content(&self, _file_id: &str, bytes: &[u8], _mime: &str) -> Result<()> {
        self.uploaded_bytes.lock().unwrap().push(bytes.len());
        Ok(())
    }

    async fn set_public_readable(&self, file_id: &str) -> Result<()> {
        self.public_files.lock().unwrap().push(file_id.to_string());
        Ok(())
    }

    async fn get_shareable_link(&self, file_id: &str) -> Result<String> {
        Ok(format!("https://drive.example.com/file/d/{}/view", file_id))
    }
}

#[async_trait]
impl SheetAppender for Recorder {
    async fn append_row(&self, spreadsheet_id: &str, tab: &str, row: Vec<String>) -> Result<()> {
        if self.sheet_fails.load(Ordering::SeqCst) {
            return Err(unavailable("sheets"));
        }
        self.rows
            .lock()
            .unwrap()
            .push((spreadsheet_id.to_string(), tab.to_string(), row));
        Ok(())
    }
}

#[async_trait]
impl Geocoder for Recorder {
    async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<Option<String>> {
        if self.geocode_fails.load(Ordering::SeqCst) {
            return Err(unavailable("geocode"));
        }
        Ok(self.address.lock().unwrap().clone())
    }
}

#[async_trait]
impl CalendarScheduler for Recorder {
    async fn schedule(&self, calendar_id: &str, reminder: &FollowUpReminder) -> Result<()> {
        self.reminders
            .lock()
            .unwrap()
            .push((calendar_id.to_string(), reminder.clone()));
        Ok(())
    }
}

#[async_trait]
impl Mailer for Recorder {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<()> {
        if self.mail_fails.load(Ordering::SeqCst) {
            return Err(unavailable("mail"));
        }
        self.mails.lock().unwrap().push((
            to.to_string(),
            subject.to_string(),
            html_body.to_string(),
        ));
        Ok(())
    }
}
