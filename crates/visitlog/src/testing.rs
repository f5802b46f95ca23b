//! In-memory row store shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::{Identity, KnownContact, Site, VisitRecord};
use crate::services::{Result, RowStore, ServiceError};

pub(crate) fn identity(email: &str, rm: &str, zm: &str) -> Identity {
    Identity {
        email: email.to_string(),
        reporting_manager_email: rm.to_string(),
        zonal_manager_email: zm.to_string(),
        status: "Active".to_string(),
    }
}

pub(crate) fn site(name: &str, district: &str) -> Site {
    Site {
        name: name.to_string(),
        district: district.to_string(),
        state: "Maharashtra".to_string(),
        contacts: vec![KnownContact {
            name: "Asha Rao".to_string(),
            designation: "Principal".to_string(),
            phone: "9876543210".to_string(),
            email: "asha@school.in".to_string(),
        }],
    }
}

#[derive(Default)]
pub(crate) struct TableStore {
    pub identities: Vec<Identity>,
    /// (owner e-mail, site)
    pub sites: Vec<(String, Site)>,
    pub saved: Mutex<Vec<VisitRecord>>,
}

impl TableStore {
    /// Two field reps under one zonal manager, one of them managing a third.
    pub fn sample() -> Self {
        let owner = "asha.rao@pw.live".to_string();
        Self {
            identities: vec![
                identity("asha.rao@pw.live", "rm@pw.live", "zm@pw.live"),
                identity("vikram.singh@pw.live", "rm@pw.live", "zm@pw.live"),
                identity("neha@pw.live", "asha.rao@pw.live", "zm@pw.live"),
                identity("other@pw.live", "rm2@pw.live", "zm2@pw.live"),
                identity("solo@pw.live", "", ""),
            ],
            sites: vec![
                (owner.clone(), site("Zenith School", "Pune")),
                (owner.clone(), site("Alpha Academy", "Nashik")),
                (owner.clone(), site("Beta High", "Pune")),
                ("vikram.singh@pw.live".to_string(), site("Gamma Vidyalaya", "Thane")),
            ],
            saved: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RowStore for TableStore {
    async fn find_active_identity(&self, email: &str) -> Result<Option<Identity>> {
        Ok(self
            .identities
            .iter()
            .find(|i| i.email == email && i.is_active())
            .cloned())
    }

    async fn list_peers(&self, zm: &str, exclude: &str) -> Result<Vec<Identity>> {
        Ok(self
            .identities
            .iter()
            .filter(|i| i.zonal_manager_email == zm && i.email != exclude)
            .cloned()
            .collect())
    }

    async fn list_direct_reports(&self, email: &str) -> Result<Vec<Identity>> {
        Ok(self
            .identities
            .iter()
            .filter(|i| i.reporting_manager_email == email)
            .cloned()
            .collect())
    }

    async fn list_sites(&self, email: &str, district: Option<&str>) -> Result<Vec<Site>> {
        Ok(self
            .sites
            .iter()
            .filter(|(owner, s)| owner == email && district.map_or(true, |d| s.district == d))
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn list_districts(&self, email: &str) -> Result<Vec<String>> {
        Ok(self
            .sites
            .iter()
            .filter(|(owner, _)| owner == email)
            .map(|(_, s)| s.district.clone())
            .collect())
    }

    async fn save_visit(&self, record: &VisitRecord) -> Result<()> {
        self.saved
            .lock()
            .map_err(|_| ServiceError::Api {
                service: "row store",
                message: "poisoned".to_string(),
            })?
            .push(record.clone());
        Ok(())
    }
}

/// Every call fails.
pub(crate) struct BrokenStore;

fn down() -> ServiceError {
    ServiceError::Api {
        service: "row store",
        message: "connection refused".to_string(),
    }
}

#[async_trait]
impl RowStore for BrokenStore {
    async fn find_active_identity(&self, _: &str) -> Result<Option<Identity>> {
        Err(down())
    }
    async fn list_peers(&self, _: &str, _: &str) -> Result<Vec<Identity>> {
        Err(down())
    }
    async fn list_direct_reports(&self, _: &str) -> Result<Vec<Identity>> {
        Err(down())
    }
    async fn list_sites(&self, _: &str, _: Option<&str>) -> Result<Vec<Site>> {
        Err(down())
    }
    async fn list_districts(&self, _: &str) -> Result<Vec<String>> {
        Err(down())
    }
    async fn save_visit(&self, _: &VisitRecord) -> Result<()> {
        Err(down())
    }
}
