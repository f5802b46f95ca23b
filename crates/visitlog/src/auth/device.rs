//! OAuth2 Device Authorization Grant (RFC 8628) consent provider.
//!
//! The service has no browser of its own, so consent is granted by the user
//! on any device: the user code is surfaced through a [`ConsentPrompt`] and
//! the token endpoint is polled until the user approves, denies or the code
//! expires.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::{ApiEndpoints, GoogleConfig};

use super::error::{AuthError, Result};
use super::provider::{ConsentPrompt, ConsentProvider, ConsentRequest, GrantedToken};
use super::token::AuthToken;

const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Floor on the polling window, for servers reporting a tiny `expires_in`.
const MIN_POLL_TTL_SECS: u64 = 5;

const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

fn sanitize_error_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    user_code: String,
    #[serde(alias = "verification_url")]
    verification_uri: String,
    #[serde(default)]
    verification_uri_complete: Option<String>,
    expires_in: u64,
    #[serde(default = "default_interval")]
    interval: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl From<TokenResponse> for GrantedToken {
    fn from(response: TokenResponse) -> Self {
        GrantedToken {
            access_token: SecretString::from(response.access_token),
            expires_in: response.expires_in,
            refresh_token: response.refresh_token.map(SecretString::from),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Device-flow consent against Google's OAuth endpoints.
pub struct DeviceConsent {
    client: Client,
    device_auth_url: String,
    token_url: String,
    revoke_url: String,
    client_id: SecretString,
    client_secret: SecretString,
    scopes: Vec<String>,
    prompt: Arc<dyn ConsentPrompt>,
}

impl DeviceConsent {
    pub fn new(
        client: Client,
        endpoints: &ApiEndpoints,
        google: &GoogleConfig,
        prompt: Arc<dyn ConsentPrompt>,
    ) -> Result<Self> {
        let client_id = google
            .client_id
            .resolve()
            .map_err(|e| AuthError::Provider(format!("OAuth client id: {}", e)))?;
        let client_secret = google
            .client_secret
            .resolve()
            .map_err(|e| AuthError::Provider(format!("OAuth client secret: {}", e)))?;

        Ok(Self {
            client,
            device_auth_url: endpoints.device_authorization.clone(),
            token_url: endpoints.token.clone(),
            revoke_url: endpoints.revoke.clone(),
            client_id,
            client_secret,
            scopes: google.scopes.clone(),
            prompt,
        })
    }

    async fn request_device_code(&self) -> Result<DeviceCodeResponse> {
        let scope = self.scopes.join(" ");
        info!("Requesting device code for scopes: {}", scope);

        let params = [
            ("client_id", self.client_id.expose_secret()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .client
            .post(&self.device_auth_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to request device code: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "Device code request failed ({}): {}",
                status,
                sanitize_error_body(&body)
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse device code: {}", e)))
    }

    async fn poll_for_token(&self, device_code: &DeviceCodeResponse) -> Result<TokenResponse> {
        let ttl_secs = device_code.expires_in.max(MIN_POLL_TTL_SECS);
        let deadline = tokio::time::Instant::now() + Duration::from_secs(ttl_secs);

        let max_interval = Duration::from_secs(30);
        let mut interval = Duration::from_secs(device_code.interval).max(Duration::from_secs(1));

        debug!("Polling for consent (expires in {}s)", ttl_secs);

        loop {
            if tokio::time::Instant::now() > deadline {
                return Err(AuthError::Cancelled(
                    "Consent request expired before authorization".to_string(),
                ));
            }

            tokio::time::sleep(interval).await;

            let params = [
                ("client_id", self.client_id.expose_secret()),
                ("client_secret", self.client_secret.expose_secret()),
                ("device_code", device_code.device_code.as_str()),
                ("grant_type", DEVICE_CODE_GRANT_TYPE),
            ];

            let response = self
                .client
                .post(&self.token_url)
                .form(&params)
                .send()
                .await
                .map_err(|e| AuthError::Provider(format!("Token request failed: {}", e)))?;

            if response.status().is_success() {
                return response.json().await.map_err(|e| {
                    AuthError::Provider(format!("Failed to parse token response: {}", e))
                });
            }

            let error: TokenErrorResponse = response.json().await.map_err(|e| {
                AuthError::Provider(format!("Failed to parse error response: {}", e))
            })?;

            match error.error.as_str() {
                "authorization_pending" => {
                    debug!("Authorization pending, continuing to poll");
                }
                "slow_down" => {
                    interval = (interval + Duration::from_secs(5)).min(max_interval);
                    warn!("Server requested slow down, new interval: {:?}", interval);
                }
                "expired_token" => {
                    return Err(AuthError::Cancelled(
                        "Consent request expired before authorization".to_string(),
                    ));
                }
                "access_denied" => {
                    return Err(AuthError::Cancelled(
                        "User denied the authorization request".to_string(),
                    ));
                }
                _ => {
                    return Err(AuthError::Provider(format!(
                        "Token request error: {} - {}",
                        error.error,
                        error.error_description.unwrap_or_default()
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl ConsentProvider for DeviceConsent {
    async fn interactive(&self) -> Result<GrantedToken> {
        let device_code = self.request_device_code().await?;
        self.prompt.show(&ConsentRequest {
            user_code: device_code.user_code.clone(),
            verification_uri: device_code.verification_uri.clone(),
            verification_uri_complete: device_code.verification_uri_complete.clone(),
            expires_in: device_code.expires_in,
        });

        let token = self.poll_for_token(&device_code).await?;
        info!("Consent granted");
        Ok(token.into())
    }

    async fn refresh(&self, current: &AuthToken) -> Result<GrantedToken> {
        let refresh_token = current.refresh_token().ok_or(AuthError::NoRefreshToken)?;

        let params = [
            ("client_id", self.client_id.expose_secret()),
            ("client_secret", self.client_secret.expose_secret()),
            ("refresh_token", refresh_token.expose_secret()),
            ("grant_type", "refresh_token"),
        ];

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Token refresh failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Provider(format!(
                "Token refresh failed ({}): {}",
                status,
                sanitize_error_body(&body)
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to parse refresh response: {}", e)))?;

        info!("Refreshed access token");
        Ok(token.into())
    }

    async fn revoke(&self, token: &AuthToken) -> Result<()> {
        let response = self
            .client
            .post(&self.revoke_url)
            .form(&[("token", token.access_token().expose_secret())])
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Token revocation failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "Token revocation failed ({})",
                response.status()
            )));
        }
        Ok(())
    }
}
