use async_trait::async_trait;
use secrecy::SecretString;

use super::error::Result;
use super::token::AuthToken;

/// Token material returned by the identity provider.
#[derive(Debug, Clone)]
pub struct GrantedToken {
    pub access_token: SecretString,
    /// Lifetime in seconds, if the provider reported one.
    pub expires_in: Option<u64>,
    pub refresh_token: Option<SecretString>,
}

/// The identity provider behind the token manager.
#[async_trait]
pub trait ConsentProvider: Send + Sync {
    /// Runs the interactive consent flow. May take as long as the user does.
    async fn interactive(&self) -> Result<GrantedToken>;

    /// Obtains a fresh token without user interaction.
    async fn refresh(&self, current: &AuthToken) -> Result<GrantedToken>;

    async fn revoke(&self, _token: &AuthToken) -> Result<()> {
        Ok(())
    }
}

/// What the user has to do to grant consent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentRequest {
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: Option<String>,
    pub expires_in: u64,
}

/// Surfaces a pending consent request to whoever can act on it.
pub trait ConsentPrompt: Send + Sync {
    fn show(&self, request: &ConsentRequest);
}

/// Writes the consent instructions to the log.
pub struct LogPrompt;

impl ConsentPrompt for LogPrompt {
    fn show(&self, request: &ConsentRequest) {
        log::warn!(
            "Authorization required: visit {} and enter code {} (expires in {}s)",
            request
                .verification_uri_complete
                .as_deref()
                .unwrap_or(&request.verification_uri),
            request.user_code,
            request.expires_in
        );
    }
}
