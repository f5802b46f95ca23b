//! A persisted token survives a restart and is reused without consent.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use visitlog::auth::{
    AuthError, AuthStatus, AuthToken, ConsentProvider, FileTokenStore, GrantedToken, TokenManager,
    TokenPolicy, TokenStore,
};
use visitlog::TokenEncryptor;

/// Grants "granted-<n>" tokens and counts consent prompts.
#[derive(Default)]
struct CountingConsent {
    prompts: AtomicUsize,
}

#[async_trait]
impl ConsentProvider for CountingConsent {
    async fn interactive(&self) -> Result<GrantedToken, AuthError> {
        let n = self.prompts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(GrantedToken {
            access_token: SecretString::from(format!("granted-{}", n)),
            expires_in: Some(3600),
            refresh_token: None,
        })
    }

    async fn refresh(&self, _current: &AuthToken) -> Result<GrantedToken, AuthError> {
        Err(AuthError::NoRefreshToken)
    }
}

fn encryptor() -> TokenEncryptor {
    TokenEncryptor::from_base64_key(&BASE64.encode([7u8; 32])).unwrap()
}

#[tokio::test]
async fn test_token_reused_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let consent = Arc::new(CountingConsent::default());

    let first = TokenManager::new(
        consent.clone(),
        Arc::new(FileTokenStore::new(&path)),
        TokenPolicy::default(),
    );
    let token = first.get_valid_token().await.unwrap();
    assert_eq!(token.expose_secret(), "granted-1");
    assert!(path.exists());

    let restarted = TokenManager::new(
        consent.clone(),
        Arc::new(FileTokenStore::new(&path)),
        TokenPolicy::default(),
    );
    assert_eq!(restarted.status(), AuthStatus::Unauthenticated);
    let token = restarted.get_valid_token().await.unwrap();
    assert_eq!(token.expose_secret(), "granted-1");
    assert_eq!(consent.prompts.load(Ordering::SeqCst), 1);
    assert!(matches!(
        restarted.status(),
        AuthStatus::Authenticated { .. }
    ));

    restarted.sign_out().await.unwrap();
    assert!(!path.exists());
    first.sign_out().await.unwrap();
}

#[tokio::test]
async fn test_expired_persisted_token_prompts_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let store = FileTokenStore::new(&path);
    store
        .save(&AuthToken::new(
            SecretString::from("stale".to_string()),
            Utc::now() - Duration::minutes(5),
            None,
        ))
        .unwrap();

    let consent = Arc::new(CountingConsent::default());
    let manager = TokenManager::new(consent.clone(), Arc::new(store), TokenPolicy::default());
    let token = manager.get_valid_token().await.unwrap();

    assert_eq!(token.expose_secret(), "granted-1");
    assert_eq!(consent.prompts.load(Ordering::SeqCst), 1);
    manager.sign_out().await.unwrap();
}

#[test]
fn test_encrypted_store_hides_token() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("token.json");
    let store = FileTokenStore::new(&path).with_encryptor(encryptor());
    store
        .save(&AuthToken::new(
            SecretString::from("ya29.secret-access".to_string()),
            Utc::now() + Duration::hours(1),
            Some(SecretString::from("1//refresh".to_string())),
        ))
        .unwrap();

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(!on_disk.contains("ya29.secret-access"));
    assert!(!on_disk.contains("1//refresh"));

    let reopened = FileTokenStore::new(&path).with_encryptor(encryptor());
    let loaded = reopened.load().unwrap().unwrap();
    assert_eq!(loaded.access_token().expose_secret(), "ya29.secret-access");
    assert_eq!(
        loaded.refresh_token().map(|t| t.expose_secret().to_string()),
        Some("1//refresh".to_string())
    );
}
