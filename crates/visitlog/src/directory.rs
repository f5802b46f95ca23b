//! Directory lookup: identities, co-visitors, sites and districts.
//!
//! Lookups never fail the caller. A row-store error is logged and the
//! lookup answers with an empty result.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::model::{CoVisitor, Identity, Site};
use crate::services::RowStore;

#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn RowStore>,
    catalog: BTreeMap<String, Vec<String>>,
}

impl Directory {
    pub fn new(store: Arc<dyn RowStore>, catalog: BTreeMap<String, Vec<String>>) -> Self {
        Self { store, catalog }
    }

    pub async fn find_identity(&self, email: &str) -> Option<Identity> {
        let email = email.trim().to_lowercase();
        match self.store.find_active_identity(&email).await {
            Ok(identity) => identity.filter(|i| i.is_active()),
            Err(e) => {
                log::warn!("Identity lookup for {} failed: {}", email, e);
                None
            }
        }
    }

    /// Active peers sharing the requester's zonal manager, excluding the
    /// requester.
    pub async fn co_visitors(&self, email: &str) -> Vec<CoVisitor> {
        let email = email.trim().to_lowercase();
        let Some(identity) = self.find_identity(&email).await else {
            return Vec::new();
        };
        if identity.zonal_manager_email.is_empty() {
            log::debug!("{} has no zonal manager; no co-visitors", email);
            return Vec::new();
        }

        match self
            .store
            .list_peers(&identity.zonal_manager_email, &email)
            .await
        {
            Ok(peers) => peers
                .into_iter()
                .filter(|p| !p.email.eq_ignore_ascii_case(&email))
                .map(|p| CoVisitor::from_email(&p.email))
                .collect(),
            Err(e) => {
                log::warn!("Co-visitor lookup for {} failed: {}", email, e);
                Vec::new()
            }
        }
    }

    pub async fn sites(&self, email: &str, district: Option<&str>) -> Vec<Site> {
        match self.store.list_sites(&email.to_lowercase(), district).await {
            Ok(sites) => sites,
            Err(e) => {
                log::warn!("Site lookup for {} failed: {}", email, e);
                Vec::new()
            }
        }
    }

    /// Distinct districts of the requester's sites, sorted.
    pub async fn districts(&self, email: &str) -> Vec<String> {
        match self.store.list_districts(&email.to_lowercase()).await {
            Ok(districts) => districts
                .into_iter()
                .filter(|d| !d.trim().is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
            Err(e) => {
                log::warn!("District lookup for {} failed: {}", email, e);
                Vec::new()
            }
        }
    }

    /// True when at least one active identity reports to `email`.
    pub async fn is_manager(&self, email: &str) -> bool {
        match self.store.list_direct_reports(&email.to_lowercase()).await {
            Ok(reports) => !reports.is_empty(),
            Err(e) => {
                log::warn!("Direct-report lookup for {} failed: {}", email, e);
                false
            }
        }
    }

    pub fn product_catalog(&self) -> &BTreeMap<String, Vec<String>> {
        &self.catalog
    }
}
