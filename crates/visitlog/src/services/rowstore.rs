//! PostgREST (Supabase-style) row store.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::RowStoreConfig;
use crate::model::directory::ACTIVE_STATUS;
use crate::model::{Identity, KnownContact, Site, VisitRecord};

use super::error::{Result, ServiceError};
use super::http::{decode_error, ensure_success, send_error};
use super::RowStore;

const SERVICE: &str = "row store";

const IDENTITY_COLUMNS: &str = "email,reporting_manager_email,zonal_manager_email,status";

pub struct PostgrestRowStore {
    client: Client,
    base_url: String,
    api_key: SecretString,
    identity_table: String,
    sites_table: String,
    visits_table: String,
}

impl PostgrestRowStore {
    pub fn new(client: Client, config: &RowStoreConfig) -> Result<Self> {
        let api_key = config.api_key.resolve().map_err(|e| ServiceError::Api {
            service: SERVICE,
            message: format!("API key: {}", e),
        })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
            identity_table: config.identity_table.clone(),
            sites_table: config.sites_table.clone(),
            visits_table: config.visits_table.clone(),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        let url = format!("{}/rest/v1/{}", self.base_url, table);
        self.client
            .request(method, url)
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(self.api_key.expose_secret())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let response = request.send().await.map_err(send_error(SERVICE))?;
        ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(decode_error(SERVICE))
    }

    async fn identities(&self, filters: &[(&str, String)]) -> Result<Vec<Identity>> {
        let request = self
            .request(Method::GET, &self.identity_table)
            .query(&[("select", IDENTITY_COLUMNS)])
            .query(filters)
            .query(&[("status", eq(ACTIVE_STATUS))]);
        let rows: Vec<IdentityRow> = self.fetch(request).await?;
        Ok(rows.into_iter().map(Identity::from).collect())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn neq(value: &str) -> String {
    format!("neq.{}", value)
}

#[derive(Debug, Deserialize)]
struct IdentityRow {
    email: String,
    #[serde(default)]
    reporting_manager_email: Option<String>,
    #[serde(default)]
    zonal_manager_email: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Identity {
            email: row.email,
            reporting_manager_email: row.reporting_manager_email.unwrap_or_default(),
            zonal_manager_email: row.zonal_manager_email.unwrap_or_default(),
            status: row.status.unwrap_or_default(),
        }
    }
}

/// A row of the sites table. Contacts are stored inline as two column groups.
#[derive(Debug, Default, Deserialize)]
struct SiteRow {
    school_name: String,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    spoc1_name: Option<String>,
    #[serde(default)]
    spoc1_designation: Option<String>,
    #[serde(default)]
    spoc1_phone_number: Option<String>,
    #[serde(default)]
    spoc1_email: Option<String>,
    #[serde(default)]
    spoc2_name: Option<String>,
    #[serde(default)]
    spoc2_designation: Option<String>,
    #[serde(default)]
    spoc2_phone_number: Option<String>,
    #[serde(default)]
    spoc2_email: Option<String>,
}

fn contact(
    name: Option<String>,
    designation: Option<String>,
    phone: Option<String>,
    email: Option<String>,
) -> Option<KnownContact> {
    let name = name.filter(|n| !n.trim().is_empty())?;
    Some(KnownContact {
        name,
        designation: designation.unwrap_or_default(),
        phone: phone.unwrap_or_default(),
        email: email.unwrap_or_default(),
    })
}

impl From<SiteRow> for Site {
    fn from(row: SiteRow) -> Self {
        let contacts = [
            contact(
                row.spoc1_name,
                row.spoc1_designation,
                row.spoc1_phone_number,
                row.spoc1_email,
            ),
            contact(
                row.spoc2_name,
                row.spoc2_designation,
                row.spoc2_phone_number,
                row.spoc2_email,
            ),
        ]
        .into_iter()
        .flatten()
        .collect();

        Site {
            name: row.school_name,
            district: row.district.unwrap_or_default(),
            state: row.state.unwrap_or_default(),
            contacts,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DistrictRow {
    #[serde(default)]
    district: Option<String>,
}

/// Column layout of the visits table.
#[derive(Debug, Serialize)]
struct VisitRow<'a> {
    submission_id: &'a str,
    submitted_at: String,
    user_email: &'a str,
    rm_email: &'a str,
    zm_email: &'a str,
    state: &'a str,
    district: &'a str,
    school: &'a str,
    meeting_outcome: &'a str,
    selected_skus: String,
    spoc_type: &'static str,
    spoc_designation: &'a str,
    spoc_name: &'a str,
    spoc_phone: &'a str,
    spoc_email: &'a str,
    co_visitor1: &'a str,
    co_visitor2: &'a str,
    remarks: &'a str,
    image_url: &'a str,
    follow_up_date: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    location_address: &'a str,
}

impl<'a> From<&'a VisitRecord> for VisitRow<'a> {
    fn from(record: &'a VisitRecord) -> Self {
        VisitRow {
            submission_id: &record.submission_id,
            submitted_at: record.submitted_at.to_rfc3339(),
            user_email: &record.user_email,
            rm_email: &record.rm_email,
            zm_email: &record.zm_email,
            state: &record.state,
            district: &record.district,
            school: &record.school,
            meeting_outcome: &record.outcome,
            selected_skus: record.skus_text(),
            spoc_type: record.contact.kind.label(),
            spoc_designation: &record.contact.designation,
            spoc_name: &record.contact.name,
            spoc_phone: &record.contact.phone,
            spoc_email: &record.contact.email,
            co_visitor1: record.co_visitor(0),
            co_visitor2: record.co_visitor(1),
            remarks: &record.remarks,
            image_url: record.photo_url.as_text(),
            follow_up_date: record.follow_up.map(|t| t.to_rfc3339()),
            latitude: record.coordinates.map(|c| c.latitude),
            longitude: record.coordinates.map(|c| c.longitude),
            location_address: record.address.as_text(),
        }
    }
}

#[async_trait]
impl RowStore for PostgrestRowStore {
    async fn find_active_identity(&self, email: &str) -> Result<Option<Identity>> {
        let email = email.trim().to_lowercase();
        let request = self
            .request(Method::GET, &self.identity_table)
            .query(&[
                ("select", IDENTITY_COLUMNS.to_string()),
                ("email", eq(&email)),
                ("status", eq(ACTIVE_STATUS)),
                ("limit", "1".to_string()),
            ]);
        let rows: Vec<IdentityRow> = self.fetch(request).await?;
        Ok(rows.into_iter().next().map(Identity::from))
    }

    async fn list_peers(&self, zonal_manager_email: &str, exclude: &str) -> Result<Vec<Identity>> {
        self.identities(&[
            ("zonal_manager_email", eq(zonal_manager_email)),
            ("email", neq(&exclude.to_lowercase())),
        ])
        .await
    }

    async fn list_direct_reports(&self, email: &str) -> Result<Vec<Identity>> {
        self.identities(&[("reporting_manager_email", eq(&email.to_lowercase()))])
            .await
    }

    async fn list_sites(&self, email: &str, district: Option<&str>) -> Result<Vec<Site>> {
        let mut filters = vec![
            ("select", "*".to_string()),
            ("employee_email", eq(&email.to_lowercase())),
            ("status", eq(ACTIVE_STATUS)),
        ];
        if let Some(district) = district {
            filters.push(("district", eq(district)));
        }
        let request = self.request(Method::GET, &self.sites_table).query(&filters);
        let rows: Vec<SiteRow> = self.fetch(request).await?;
        Ok(rows.into_iter().map(Site::from).collect())
    }

    async fn list_districts(&self, email: &str) -> Result<Vec<String>> {
        let request = self.request(Method::GET, &self.sites_table).query(&[
            ("select", "district".to_string()),
            ("employee_email", eq(&email.to_lowercase())),
            ("status", eq(ACTIVE_STATUS)),
        ]);
        let rows: Vec<DistrictRow> = self.fetch(request).await?;
        Ok(rows.into_iter().filter_map(|r| r.district).collect())
    }

    async fn save_visit(&self, record: &VisitRecord) -> Result<()> {
        let response = self
            .request(Method::POST, &self.visits_table)
            .header("Prefer", "return=minimal")
            .json(&VisitRow::from(record))
            .send()
            .await
            .map_err(send_error(SERVICE))?;
        ensure_success(SERVICE, response).await?;
        log::debug!("Saved visit {} to {}", record.submission_id, self.visits_table);
        Ok(())
    }
}
