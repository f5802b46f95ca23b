use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisitlogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Location error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Authentication error: {0}")]
    Auth(#[from] crate::auth::AuthError),

    #[error("Service error: {0}")]
    Service(#[from] crate::services::ServiceError),

    #[error("Submission failed: {0}")]
    Submission(#[from] crate::pipeline::SubmissionError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Session error: {0}")]
    Session(#[from] crate::session::SessionError),

    #[error("Validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationErrors),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Secret '{name}' could not be resolved: {reason}")]
    MissingSecret { name: String, reason: String },
}

/// Errors raised while normalizing a captured photo. All of them are
/// recoverable: the user can capture the photo again.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Photo is empty")]
    Empty,

    #[error("Failed to decode photo: {0}")]
    Decode(String),

    #[error("Failed to encode photo: {0}")]
    Encode(String),

    #[error("Invalid photo data URL: {0}")]
    DataUrl(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location access is required. Please allow location access.")]
    Denied,

    #[error("Geolocation is not supported by this client.")]
    Unsupported,
}

pub type Result<T> = std::result::Result<T, VisitlogError>;
