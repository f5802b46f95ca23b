use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::secrets::TokenEncryptor;

use super::error::{AuthError, Result};
use super::token::AuthToken;

/// Durable storage for the most recent token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<AuthToken>>;
    fn save(&self, token: &AuthToken) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// On-disk representation. With an encryptor configured the token fields hold
/// ciphertext.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredToken {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
    expires_at: DateTime<Utc>,
    #[serde(default)]
    encrypted: bool,
}

/// JSON file store, optionally encrypted with AES-256-GCM.
pub struct FileTokenStore {
    path: PathBuf,
    encryptor: Option<TokenEncryptor>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encryptor: None,
        }
    }

    pub fn with_encryptor(mut self, encryptor: TokenEncryptor) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn seal(&self, value: &str) -> Result<String> {
        match &self.encryptor {
            Some(enc) => enc
                .encrypt(value)
                .map_err(|e| AuthError::Storage(e.to_string())),
            None => Ok(value.to_string()),
        }
    }

    fn open(&self, value: &str, encrypted: bool) -> Result<String> {
        match (&self.encryptor, encrypted) {
            (_, false) => Ok(value.to_string()),
            (Some(enc), true) => enc
                .decrypt(value)
                .map_err(|e| AuthError::Storage(e.to_string())),
            (None, true) => Err(AuthError::Storage(
                "Token store is encrypted but no key is configured".to_string(),
            )),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<AuthToken>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AuthError::Storage(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let stored: StoredToken = serde_json::from_str(&content)
            .map_err(|e| AuthError::Storage(format!("Corrupt token store: {}", e)))?;

        let access_token = self.open(&stored.access_token, stored.encrypted)?;
        let refresh_token = stored
            .refresh_token
            .as_deref()
            .map(|t| self.open(t, stored.encrypted))
            .transpose()?;

        Ok(Some(AuthToken::new(
            SecretString::from(access_token),
            stored.expires_at,
            refresh_token.map(SecretString::from),
        )))
    }

    fn save(&self, token: &AuthToken) -> Result<()> {
        let stored = StoredToken {
            access_token: self.seal(token.access_token().expose_secret())?,
            refresh_token: token
                .refresh_token()
                .map(|t| self.seal(t.expose_secret()))
                .transpose()?,
            expires_at: token.expires_at(),
            encrypted: self.encryptor.is_some(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AuthError::Storage(e.to_string()))?;
            }
        }

        let json =
            serde_json::to_string_pretty(&stored).map_err(|e| AuthError::Storage(e.to_string()))?;
        fs::write(&self.path, json).map_err(|e| {
            AuthError::Storage(format!("Failed to write '{}': {}", self.path.display(), e))
        })?;
        log::debug!("Persisted token to {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}

/// Process-local store; tokens are lost on restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<AuthToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: AuthToken) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<AuthToken>> {
        Ok(self
            .token
            .lock()
            .map_err(|_| AuthError::Storage("token store lock poisoned".to_string()))?
            .clone())
    }

    fn save(&self, token: &AuthToken) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| AuthError::Storage("token store lock poisoned".to_string()))? =
            Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self
            .token
            .lock()
            .map_err(|_| AuthError::Storage("token store lock poisoned".to_string()))? = None;
        Ok(())
    }
}
