use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::secrets::SecretSource;

/// Calendar id shipped in sample configs; treated as "no calendar configured".
pub const CALENDAR_ID_PLACEHOLDER: &str = "PASTE_YOUR_CALENDAR_ID_HERE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// Login e-mails must end with this suffix, e.g. `@pw.live`.
    pub company_email_domain: String,
    pub row_store: RowStoreConfig,
    pub google: GoogleConfig,
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub api: ApiEndpoints,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub submission: SubmissionConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default = "default_product_catalog")]
    pub product_catalog: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowStoreConfig {
    /// Base URL of the PostgREST endpoint, e.g. `https://xyz.supabase.co`.
    pub url: String,
    pub api_key: SecretSource,
    #[serde(default = "default_identity_table")]
    pub identity_table: String,
    #[serde(default = "default_sites_table")]
    pub sites_table: String,
    #[serde(default = "default_visits_table")]
    pub visits_table: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    pub client_id: SecretSource,
    pub client_secret: SecretSource,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub maps_api_key: Option<SecretSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsConfig {
    pub response_spreadsheet_id: String,
    #[serde(default = "default_tab_name")]
    pub response_tab_name: String,
    pub image_folder_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalendarConfig {
    #[serde(default)]
    pub calendar_id: Option<String>,
}

impl CalendarConfig {
    /// The configured calendar, ignoring blanks and the sample placeholder.
    pub fn destination(&self) -> Option<&str> {
        self.calendar_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty() && *id != CALENDAR_ID_PLACEHOLDER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEndpoints {
    #[serde(default = "default_sheets_api")]
    pub sheets: String,
    #[serde(default = "default_drive_api")]
    pub drive: String,
    #[serde(default = "default_drive_upload_api")]
    pub drive_upload: String,
    #[serde(default = "default_calendar_api")]
    pub calendar: String,
    #[serde(default = "default_geocode_api")]
    pub geocode: String,
    #[serde(default = "default_device_auth_url")]
    pub device_authorization: String,
    #[serde(default = "default_token_url")]
    pub token: String,
    #[serde(default = "default_revoke_url")]
    pub revoke: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            sheets: default_sheets_api(),
            drive: default_drive_api(),
            drive_upload: default_drive_upload_api(),
            calendar: default_calendar_api(),
            geocode: default_geocode_api(),
            device_authorization: default_device_auth_url(),
            token: default_token_url(),
            revoke: default_revoke_url(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality in `(0, 1]`.
    pub quality: f32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            quality: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionConfig {
    pub id_prefix: String,
    /// Offset used for the sheet timestamp and follow-up dates (IST = 330).
    pub utc_offset_minutes: i32,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            id_prefix: "K25LVT".to_string(),
            utc_offset_minutes: 330,
        }
    }
}

impl SubmissionConfig {
    /// The configured local offset; out-of-range values fall back to UTC.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub token_store_path: Option<PathBuf>,
    #[serde(default)]
    pub encrypt_token_store: bool,
    #[serde(default = "default_token_lifetime_secs")]
    pub token_lifetime_secs: u64,
    #[serde(default = "default_refresh_lead_secs")]
    pub refresh_lead_secs: u64,
    #[serde(default = "default_expiry_margin_secs")]
    pub expiry_margin_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_store_path: None,
            encrypt_token_store: false,
            token_lifetime_secs: default_token_lifetime_secs(),
            refresh_lead_secs: default_refresh_lead_secs(),
            expiry_margin_secs: default_expiry_margin_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub bind_address: String,
    #[serde(default)]
    pub enable_cors: bool,
    /// Upper bound on a submission request body (photo data URL included).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Sessions unused for this long are dropped.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
    /// Open sessions kept at most; the least recently used goes first.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            enable_cors: false,
            max_body_bytes: default_max_body_bytes(),
            session_idle_secs: default_session_idle_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

fn default_identity_table() -> String {
    "emp_record".to_string()
}

fn default_sites_table() -> String {
    "lvt_universe_data".to_string()
}

fn default_visits_table() -> String {
    "lvt_visits".to_string()
}

fn default_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/spreadsheets".to_string(),
        "https://www.googleapis.com/auth/drive.file".to_string(),
        "https://www.googleapis.com/auth/calendar".to_string(),
    ]
}

fn default_tab_name() -> String {
    "Form Responses".to_string()
}

fn default_sheets_api() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".to_string()
}

fn default_drive_api() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_drive_upload_api() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

fn default_calendar_api() -> String {
    "https://www.googleapis.com/calendar/v3".to_string()
}

fn default_geocode_api() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_device_auth_url() -> String {
    "https://oauth2.googleapis.com/device/code".to_string()
}

fn default_token_url() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

fn default_revoke_url() -> String {
    "https://oauth2.googleapis.com/revoke".to_string()
}

fn default_http_timeout_secs() -> u64 {
    15
}

fn default_token_lifetime_secs() -> u64 {
    3600
}

fn default_refresh_lead_secs() -> u64 {
    300
}

fn default_expiry_margin_secs() -> u64 {
    60
}

fn default_max_body_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_session_idle_secs() -> u64 {
    8 * 60 * 60
}

fn default_max_sessions() -> usize {
    10_000
}

pub fn default_product_catalog() -> BTreeMap<String, Vec<String>> {
    let entry = |name: &str, skus: &[&str]| {
        (
            name.to_string(),
            skus.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        )
    };
    BTreeMap::from([
        entry(
            "Test Prep",
            &[
                "Physics Test Prep",
                "Chemistry Test Prep",
                "Mathematics Test Prep",
                "Biology Test Prep",
            ],
        ),
        entry(
            "K-8",
            &[
                "Science K-8",
                "Mathematics K-8",
                "English K-8",
                "Social Studies K-8",
            ],
        ),
        entry("Competitive", &["JEE Main", "JEE Advanced", "NEET", "UPSC"]),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_offset() {
        let ist = SubmissionConfig::default().local_offset();
        assert_eq!(ist.local_minus_utc(), 330 * 60);

        let broken = SubmissionConfig {
            id_prefix: "X".to_string(),
            utc_offset_minutes: 100_000,
        };
        assert_eq!(broken.local_offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_calendar_placeholder_is_unset() {
        let calendar = CalendarConfig {
            calendar_id: Some(CALENDAR_ID_PLACEHOLDER.to_string()),
        };
        assert_eq!(calendar.destination(), None);

        let calendar = CalendarConfig {
            calendar_id: Some("  ".to_string()),
        };
        assert_eq!(calendar.destination(), None);

        let calendar = CalendarConfig {
            calendar_id: Some("team@group.calendar.google.com".to_string()),
        };
        assert_eq!(
            calendar.destination(),
            Some("team@group.calendar.google.com")
        );
    }

    #[test]
    fn test_default_catalog_has_three_categories() {
        let catalog = default_product_catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog["Competitive"].len(), 4);
    }
}
