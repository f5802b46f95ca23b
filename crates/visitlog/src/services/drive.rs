//! Google Drive v3 photo storage.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;

use crate::auth::TokenManager;
use crate::config::ApiEndpoints;

use super::error::{Result, ServiceError};
use super::http::{decode_error, ensure_success, join_segments, send_error};
use super::FileStorage;

const SERVICE: &str = "drive";

pub struct DriveStorage {
    client: Client,
    api: String,
    upload_api: String,
    tokens: TokenManager,
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileInfo {
    #[serde(default)]
    web_view_link: Option<String>,
}

impl DriveStorage {
    pub fn new(client: Client, endpoints: &ApiEndpoints, tokens: TokenManager) -> Self {
        Self {
            client,
            api: endpoints.drive.clone(),
            upload_api: endpoints.drive_upload.clone(),
            tokens,
        }
    }
}

#[async_trait]
impl FileStorage for DriveStorage {
    async fn create_file(&self, name: &str, parent_folder: &str, mime_type: &str) -> Result<String> {
        let token = self.tokens.get_valid_token().await?;
        let url = join_segments(SERVICE, &self.api, &["files"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&json!({
                "name": name,
                "parents": [parent_folder],
                "mimeType": mime_type,
            }))
            .send()
            .await
            .map_err(send_error(SERVICE))?;

        let created: CreatedFile = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(decode_error(SERVICE))?;
        log::debug!("Created drive file {} ({})", created.id, name);
        Ok(created.id)
    }

    async fn write_content(&self, file_id: &str, bytes: &[u8], mime_type: &str) -> Result<()> {
        let token = self.tokens.get_valid_token().await?;
        let url = join_segments(SERVICE, &self.upload_api, &["files", file_id])?;

        let response = self
            .client
            .patch(url)
            .query(&[("uploadType", "media")])
            .bearer_auth(token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(send_error(SERVICE))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    async fn set_public_readable(&self, file_id: &str) -> Result<()> {
        let token = self.tokens.get_valid_token().await?;
        let url = join_segments(SERVICE, &self.api, &["files", file_id, "permissions"])?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(&json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(send_error(SERVICE))?;
        ensure_success(SERVICE, response).await?;
        Ok(())
    }

    async fn get_shareable_link(&self, file_id: &str) -> Result<String> {
        let token = self.tokens.get_valid_token().await?;
        let url = join_segments(SERVICE, &self.api, &["files", file_id])?;

        let response = self
            .client
            .get(url)
            .query(&[("fields", "webViewLink,name,id")])
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(send_error(SERVICE))?;

        let info: FileInfo = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(decode_error(SERVICE))?;

        info.web_view_link.ok_or_else(|| ServiceError::Decode {
            service: SERVICE,
            message: format!("file {} has no webViewLink", file_id),
        })
    }
}
