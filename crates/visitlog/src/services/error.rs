//! External service error types.

use thiserror::Error;

use crate::auth::AuthError;

/// Errors raised by the row store, drive, sheets, geocoding, calendar and
/// mail clients.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request never produced a response.
    #[error("{service} request failed: {source}")]
    Http {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode {service} response: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// The service reported an application-level failure.
    #[error("{service} error: {message}")]
    Api {
        service: &'static str,
        message: String,
    },

    #[error("Invalid {service} URL: {url}")]
    InvalidUrl { service: &'static str, url: String },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
