//! Secret resolution and token encryption at rest.
//!
//! Credentials (row-store API key, OAuth client id/secret, maps key) are
//! declared in the config as a [`SecretSource`] and resolved in priority order:
//!
//! 1. **Direct value** - for local testing (`"value": "..."`)
//! 2. **File reference** - Docker secrets pattern (`"file": "/run/secrets/key"`)
//! 3. **Env var reference** - production deployments (`"envVar": "ROWSTORE_KEY"`)

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: value, file, envVar)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),

    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Where a credential comes from. At least one field should be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
}

impl SecretSource {
    pub fn from_value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn from_env(name: impl Into<String>) -> Self {
        Self {
            env_var: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn resolve(&self) -> Result<SecretString> {
        resolve_secret(
            self.value.as_deref(),
            self.file.as_deref(),
            self.env_var.as_deref(),
        )
    }

    pub fn is_configured(&self) -> bool {
        [&self.value, &self.file, &self.env_var]
            .iter()
            .any(|s| s.as_deref().is_some_and(|s| !s.is_empty()))
    }
}

/// Resolves a secret from a direct value, then a file, then an env var.
/// Empty strings count as "not provided".
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        return fs::read_to_string(&expanded)
            .map(|content| SecretString::from(content.trim().to_string()))
            .map_err(|source| SecretError::FileReadError {
                path: expanded,
                source,
            });
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Like [`resolve_secret`] but maps "nothing configured" to `None`.
pub fn resolve_secret_optional(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<Option<SecretString>> {
    match resolve_secret(direct, file_path, env_var) {
        Ok(secret) => Ok(Some(secret)),
        Err(SecretError::NoSourceProvided) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Expands a leading `~` to the home directory. `~user/path` is not supported.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

// ============================================
// Token Encryption
// ============================================

/// Environment variable holding the key used to encrypt the persisted token.
pub const TOKEN_KEY_ENV_VAR: &str = "VISITLOG_TOKEN_KEY";

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// AES-256-GCM encryptor for the token store file.
///
/// The key is 32 bytes, supplied base64-encoded. Ciphertext is
/// `base64(nonce || ciphertext)`.
pub struct TokenEncryptor {
    cipher: Aes256Gcm,
}

impl TokenEncryptor {
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(TOKEN_KEY_ENV_VAR).map_err(|_| {
            SecretError::InvalidKey(format!("Environment variable {} not set", TOKEN_KEY_ENV_VAR))
        })?;
        Self::from_base64_key(&key)
    }

    pub fn from_base64_key(key_b64: &str) -> Result<Self> {
        let key = BASE64
            .decode(key_b64.trim())
            .map_err(|e| SecretError::InvalidKey(format!("Invalid base64 key: {}", e)))?;

        if key.len() != KEY_SIZE {
            return Err(SecretError::InvalidKey(format!(
                "Key must be {} bytes, got {} bytes",
                KEY_SIZE,
                key.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| SecretError::InvalidKey(format!("Failed to create cipher: {}", e)))?;
        Ok(Self { cipher })
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::fill(&mut nonce_bytes).map_err(|e| {
            SecretError::EncryptionError(format!("Failed to generate nonce: {}", e))
        })?;

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| SecretError::EncryptionError(e.to_string()))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);
        Ok(BASE64.encode(combined))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let combined = BASE64
            .decode(encoded.trim())
            .map_err(|e| SecretError::DecryptionError(format!("Invalid base64: {}", e)))?;

        if combined.len() < NONCE_SIZE {
            return Err(SecretError::DecryptionError("Ciphertext too short".to_string()));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| SecretError::DecryptionError(e.to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|e| SecretError::DecryptionError(format!("Invalid UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;

    fn test_key() -> String {
        BASE64.encode([7u8; KEY_SIZE])
    }

    #[test]
    fn test_direct_value_takes_priority() {
        let secret = resolve_secret(Some("direct"), Some("/nonexistent"), Some("NOPE")).unwrap();
        assert_eq!(secret.expose_secret(), "direct");
    }

    #[test]
    fn test_empty_direct_value_falls_through_to_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "from-file").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let secret = resolve_secret(Some(""), Some(&path), None).unwrap();
        assert_eq!(secret.expose_secret(), "from-file");
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = resolve_secret(None, Some("/nonexistent/secret"), None);
        assert!(matches!(result, Err(SecretError::FileReadError { .. })));
    }

    #[test]
    #[serial]
    fn test_env_var_source() {
        std::env::set_var("VISITLOG_TEST_SECRET", "  from-env \n");
        let source = SecretSource::from_env("VISITLOG_TEST_SECRET");
        assert_eq!(source.resolve().unwrap().expose_secret(), "from-env");
        std::env::remove_var("VISITLOG_TEST_SECRET");
    }

    #[test]
    #[serial]
    fn test_unset_env_var() {
        std::env::remove_var("VISITLOG_TEST_UNSET");
        let result = resolve_secret(None, None, Some("VISITLOG_TEST_UNSET"));
        assert!(matches!(result, Err(SecretError::EnvVarNotSet { .. })));
    }

    #[test]
    fn test_optional_with_no_source() {
        assert!(resolve_secret_optional(None, None, None).unwrap().is_none());
        assert!(!SecretSource::default().is_configured());
        assert!(SecretSource::from_value("x").is_configured());
    }

    #[test]
    fn test_encrypt_decrypt() {
        let encryptor = TokenEncryptor::from_base64_key(&test_key()).unwrap();
        let sealed = encryptor.encrypt("ya29.token").unwrap();
        assert_ne!(sealed, "ya29.token");
        assert_eq!(encryptor.decrypt(&sealed).unwrap(), "ya29.token");
    }

    #[test]
    fn test_nonce_differs_between_encryptions() {
        let encryptor = TokenEncryptor::from_base64_key(&test_key()).unwrap();
        assert_ne!(
            encryptor.encrypt("same").unwrap(),
            encryptor.encrypt("same").unwrap()
        );
    }

    #[test]
    fn test_wrong_key_fails_to_decrypt() {
        let sealed = TokenEncryptor::from_base64_key(&test_key())
            .unwrap()
            .encrypt("secret")
            .unwrap();
        let other = TokenEncryptor::from_base64_key(&BASE64.encode([9u8; KEY_SIZE])).unwrap();
        assert!(matches!(
            other.decrypt(&sealed),
            Err(SecretError::DecryptionError(_))
        ));
    }

    #[test]
    fn test_short_key_rejected() {
        let result = TokenEncryptor::from_base64_key(&BASE64.encode([1u8; 16]));
        assert!(matches!(result, Err(SecretError::InvalidKey(_))));
    }
}
