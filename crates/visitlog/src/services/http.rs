//! Shared HTTP plumbing for the service clients.

use std::time::Duration;

use reqwest::{Client, Response, Url};

use crate::config::ApiEndpoints;

use super::error::{Result, ServiceError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum length of an error body kept in [`ServiceError::Status`].
const MAX_ERROR_BODY_LENGTH: usize = 200;

/// Builds the client shared by every service, with connect and request
/// timeouts.
pub fn build_client(endpoints: &ApiEndpoints) -> Result<Client> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(endpoints.http_timeout_secs))
        .build()
        .map_err(|source| ServiceError::Http {
            service: "http client",
            source,
        })
}

pub(crate) fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

/// Turns a non-success response into [`ServiceError::Status`].
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        body: truncate_body(&body),
    })
}

pub(crate) fn send_error(service: &'static str) -> impl FnOnce(reqwest::Error) -> ServiceError {
    move |source| ServiceError::Http { service, source }
}

pub(crate) fn decode_error(service: &'static str) -> impl FnOnce(reqwest::Error) -> ServiceError {
    move |e| ServiceError::Decode {
        service,
        message: e.to_string(),
    }
}

/// `base` with `segments` appended, each percent-encoded as a single path
/// segment.
pub(crate) fn join_segments(service: &'static str, base: &str, segments: &[&str]) -> Result<Url> {
    let invalid = || ServiceError::InvalidUrl {
        service,
        url: base.to_string(),
    };
    let mut url = Url::parse(base).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
