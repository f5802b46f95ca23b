pub mod auth;
pub mod config;
pub mod directory;
pub mod error;
pub mod geolocation;
pub mod imaging;
pub mod model;
pub mod pipeline;
pub mod secrets;
pub mod selector;
pub mod services;
pub mod session;
pub mod validation;

#[cfg(test)]
mod testing;

pub use auth::{AuthError, AuthStatus, AuthToken, ConsentProvider, TokenManager, TokenStore};
pub use config::{load_config, load_config_from_str, Config};
pub use directory::Directory;
pub use error::{ConfigError, GeolocationError, ImageError, Result, VisitlogError};
pub use imaging::{ImageNormalizer, NormalizedImage};
pub use model::{ContactSelection, ContactSnapshot, Coordinates, Site, VisitDraft, VisitRecord};
pub use pipeline::{
    PipelineConfig, PipelineServices, StageWarning, SubmissionError, SubmissionPipeline,
    SubmissionReceipt,
};
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError, TokenEncryptor};
pub use session::{SessionCache, SessionError, SessionService, SiteScope};
pub use validation::{FieldError, ValidationErrors, VisitForm};
