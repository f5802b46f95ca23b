//! Google Sheets v4 row append.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde_json::json;

use crate::auth::TokenManager;
use crate::config::ApiEndpoints;

use super::error::Result;
use super::http::{ensure_success, join_segments, send_error};
use super::SheetAppender;

const SERVICE: &str = "sheets";

/// Columns A through W.
pub const ROW_RANGE: &str = "A:W";

pub struct SheetsAppender {
    client: Client,
    api: String,
    tokens: TokenManager,
}

impl SheetsAppender {
    pub fn new(client: Client, endpoints: &ApiEndpoints, tokens: TokenManager) -> Self {
        Self {
            client,
            api: endpoints.sheets.clone(),
            tokens,
        }
    }
}

fn append_segment(tab: &str) -> String {
    format!("{}!{}:append", tab, ROW_RANGE)
}

#[async_trait]
impl SheetAppender for SheetsAppender {
    async fn append_row(&self, spreadsheet_id: &str, tab: &str, row: Vec<String>) -> Result<()> {
        let token = self.tokens.get_valid_token().await?;
        let segment = append_segment(tab);
        let url = join_segments(SERVICE, &self.api, &[spreadsheet_id, "values", &segment])?;

        let response = self
            .client
            .post(url)
            .query(&[
                ("valueInputOption", "RAW"),
                ("insertDataOption", "INSERT_ROWS"),
            ])
            .bearer_auth(token.expose_secret())
            .json(&json!({ "values": [row] }))
            .send()
            .await
            .map_err(send_error(SERVICE))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }
}
