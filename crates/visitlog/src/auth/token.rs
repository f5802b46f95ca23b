use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::SecretString;

use crate::config::AuthConfig;

use super::provider::GrantedToken;

/// Timing rules for token validity and refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPolicy {
    /// Lifetime assumed when the provider does not report `expires_in`.
    pub default_lifetime: Duration,
    /// How long before expiry the silent refresh fires.
    pub refresh_lead: Duration,
    /// A token is treated as expired this long before its real expiry.
    pub expiry_margin: Duration,
}

impl TokenPolicy {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            default_lifetime: Duration::from_secs(config.token_lifetime_secs),
            refresh_lead: Duration::from_secs(config.refresh_lead_secs),
            expiry_margin: Duration::from_secs(config.expiry_margin_secs),
        }
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self::from_config(&AuthConfig::default())
    }
}

/// A bearer token with its absolute expiry.
#[derive(Debug, Clone)]
pub struct AuthToken {
    access_token: SecretString,
    expires_at: DateTime<Utc>,
    refresh_token: Option<SecretString>,
}

impl AuthToken {
    pub fn new(
        access_token: SecretString,
        expires_at: DateTime<Utc>,
        refresh_token: Option<SecretString>,
    ) -> Self {
        Self {
            access_token,
            expires_at,
            refresh_token,
        }
    }

    pub fn from_grant(grant: GrantedToken, now: DateTime<Utc>, policy: &TokenPolicy) -> Self {
        let lifetime = grant
            .expires_in
            .map(Duration::from_secs)
            .unwrap_or(policy.default_lifetime);
        Self {
            access_token: grant.access_token,
            expires_at: now + to_chrono(lifetime),
            refresh_token: grant.refresh_token,
        }
    }

    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&SecretString> {
        self.refresh_token.as_ref()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Keeps `fallback` when a refresh response did not rotate the refresh token.
    pub fn with_refresh_fallback(mut self, fallback: Option<&SecretString>) -> Self {
        if self.refresh_token.is_none() {
            self.refresh_token = fallback.cloned();
        }
        self
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        now + to_chrono(margin) < self.expires_at
    }

    /// Instant at which the silent refresh should fire.
    pub fn refresh_due_at(&self, lead: Duration) -> DateTime<Utc> {
        self.expires_at - to_chrono(lead)
    }
}

pub(crate) fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn grant(expires_in: Option<u64>) -> GrantedToken {
        GrantedToken {
            access_token: SecretString::from("access"),
            expires_in,
            refresh_token: None,
        }
    }

    #[test]
    fn test_expiry_from_grant() {
        let now = Utc::now();
        let token = AuthToken::from_grant(grant(Some(120)), now, &TokenPolicy::default());
        assert_eq!(token.expires_at(), now + chrono::Duration::seconds(120));
    }

    #[test]
    fn test_default_lifetime_when_provider_is_silent() {
        let now = Utc::now();
        let token = AuthToken::from_grant(grant(None), now, &TokenPolicy::default());
        assert_eq!(token.expires_at(), now + chrono::Duration::hours(1));
        assert_eq!(
            token.refresh_due_at(Duration::from_secs(300)),
            now + chrono::Duration::minutes(55)
        );
    }

    #[test]
    fn test_margin_applies_to_validity() {
        let now = Utc::now();
        let token = AuthToken::from_grant(grant(Some(90)), now, &TokenPolicy::default());
        assert!(token.is_valid_at(now, Duration::from_secs(60)));
        assert!(!token.is_valid_at(now + chrono::Duration::seconds(31), Duration::from_secs(60)));
    }

    #[test]
    fn test_refresh_fallback_keeps_old_refresh_token() {
        let old = SecretString::from("refresh-1");
        let token = AuthToken::from_grant(grant(None), Utc::now(), &TokenPolicy::default())
            .with_refresh_fallback(Some(&old));
        assert_eq!(token.refresh_token().unwrap().expose_secret(), "refresh-1");
    }
}
