//! Per-login reference data.
//!
//! A session is opened with an e-mail and a device position. Field reps get
//! their site list straight away; managers pick a district first and the
//! site list is reloaded on every district change.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

use crate::directory::Directory;
use crate::error::GeolocationError;
use crate::geolocation::PositionSource;
use crate::model::{CoVisitor, Coordinates, Identity, Site};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Please enter your email address.")]
    MissingEmail,

    #[error("Please use a valid {domain} email.")]
    WrongDomain { domain: String },

    #[error(transparent)]
    Location(#[from] GeolocationError),

    #[error("Email not found. Please contact administrator.")]
    UnknownIdentity,

    #[error("District selection is only available to managers.")]
    NotManager,
}

/// Which sites the session can currently pick from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SiteScope {
    Sites {
        sites: Vec<Site>,
    },
    Districts {
        districts: Vec<String>,
        selected: Option<String>,
        /// Sites of the selected district; empty until one is chosen.
        sites: Vec<Site>,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionCache {
    pub identity: Identity,
    pub is_manager: bool,
    /// Position captured at login, stamped onto every visit of the session.
    pub coordinates: Coordinates,
    pub co_visitors: Vec<CoVisitor>,
    pub product_catalog: BTreeMap<String, Vec<String>>,
    pub scope: SiteScope,
}

impl SessionCache {
    pub fn email(&self) -> &str {
        &self.identity.email
    }

    pub fn sites(&self) -> &[Site] {
        match &self.scope {
            SiteScope::Sites { sites } | SiteScope::Districts { sites, .. } => sites,
        }
    }

    pub fn selected_district(&self) -> Option<&str> {
        match &self.scope {
            SiteScope::Districts { selected, .. } => selected.as_deref(),
            SiteScope::Sites { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct SessionService {
    directory: Directory,
    company_domain: String,
}

impl SessionService {
    pub fn new(directory: Directory, company_domain: impl Into<String>) -> Self {
        Self {
            directory,
            company_domain: company_domain.into().to_lowercase(),
        }
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    /// Validates the e-mail, acquires the position and loads the session's
    /// reference data.
    pub async fn start(
        &self,
        email: &str,
        position: &dyn PositionSource,
    ) -> Result<SessionCache, SessionError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(SessionError::MissingEmail);
        }
        if !email.ends_with(&self.company_domain) {
            return Err(SessionError::WrongDomain {
                domain: self.company_domain.clone(),
            });
        }

        let coordinates = position.current_position().await?;

        let identity = self
            .directory
            .find_identity(&email)
            .await
            .ok_or(SessionError::UnknownIdentity)?;

        let is_manager = self.directory.is_manager(&email).await;
        let co_visitors = self.directory.co_visitors(&email).await;
        let scope = if is_manager {
            SiteScope::Districts {
                districts: self.directory.districts(&email).await,
                selected: None,
                sites: Vec::new(),
            }
        } else {
            SiteScope::Sites {
                sites: self.directory.sites(&email, None).await,
            }
        };

        log::info!(
            "Session started for {} (manager: {}, {} co-visitors)",
            email,
            is_manager,
            co_visitors.len()
        );

        Ok(SessionCache {
            identity,
            is_manager,
            coordinates,
            co_visitors,
            product_catalog: self.directory.product_catalog().clone(),
            scope,
        })
    }

    /// Replaces the site sublist with the sites of `district`. A blank
    /// district clears the selection.
    pub async fn change_district(
        &self,
        cache: &mut SessionCache,
        district: Option<&str>,
    ) -> Result<(), SessionError> {
        let district = district.map(str::trim).filter(|d| !d.is_empty());
        let loaded = match district {
            Some(d) => self.directory.sites(cache.email(), Some(d)).await,
            None => Vec::new(),
        };

        match &mut cache.scope {
            SiteScope::Districts {
                selected, sites, ..
            } => {
                *selected = district.map(str::to_string);
                *sites = loaded;
                Ok(())
            }
            SiteScope::Sites { .. } => Err(SessionError::NotManager),
        }
    }
}
