use thiserror::Error;

/// Authentication failures. `Clone` because concurrent callers share the
/// result of one consent flow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The user closed, denied or let the consent request expire.
    #[error("Authentication cancelled by user: {0}")]
    Cancelled(String),

    /// The identity provider or the network failed.
    #[error("Authentication failed: {0}")]
    Provider(String),

    /// No refresh token is available for a silent refresh.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// Reading or writing the persisted token failed.
    #[error("Token storage error: {0}")]
    Storage(String),
}

impl AuthError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AuthError::Cancelled(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
