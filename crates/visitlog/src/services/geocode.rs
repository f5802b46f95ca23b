//! Reverse geocoding via the Google Maps Geocoding API.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::model::Coordinates;

use super::error::{Result, ServiceError};
use super::http::{decode_error, ensure_success, send_error};
use super::Geocoder;

const SERVICE: &str = "geocoding";

pub struct MapsGeocoder {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

impl MapsGeocoder {
    /// Without an API key every lookup fails, and the caller degrades the
    /// address.
    pub fn new(client: Client, url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key,
        }
    }
}

impl GeocodeResponse {
    fn into_address(self) -> Result<Option<String>> {
        match self.status.as_str() {
            "OK" | "" => Ok(self
                .results
                .into_iter()
                .next()
                .map(|r| r.formatted_address)
                .filter(|a| !a.trim().is_empty())),
            "ZERO_RESULTS" => Ok(None),
            other => Err(ServiceError::Api {
                service: SERVICE,
                message: match self.error_message {
                    Some(msg) => format!("{}: {}", other, msg),
                    None => other.to_string(),
                },
            }),
        }
    }
}

#[async_trait]
impl Geocoder for MapsGeocoder {
    async fn reverse_geocode(&self, coordinates: Coordinates) -> Result<Option<String>> {
        let key = self
            .api_key
            .as_ref()
            .ok_or(ServiceError::NotConfigured("maps API key"))?;
        let latlng = format!("{},{}", coordinates.latitude, coordinates.longitude);

        let response = self
            .client
            .get(&self.url)
            .query(&[("latlng", latlng.as_str()), ("key", key.expose_secret())])
            .send()
            .await
            .map_err(send_error(SERVICE))?;

        let body: GeocodeResponse = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(decode_error(SERVICE))?;
        body.into_address()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Option<String>> {
        serde_json::from_str::<GeocodeResponse>(json)
            .unwrap()
            .into_address()
    }

    #[test]
    fn test_first_result_wins() {
        let json = r#"{"status":"OK","results":[
            {"formatted_address":"FC Road, Pune"},
            {"formatted_address":"Pune"}]}"#;
        assert_eq!(parse(json).unwrap().as_deref(), Some("FC Road, Pune"));
    }

    #[test]
    fn test_zero_results_is_none() {
        assert_eq!(parse(r#"{"status":"ZERO_RESULTS","results":[]}"#).unwrap(), None);
        assert_eq!(parse(r#"{"status":"OK","results":[]}"#).unwrap(), None);
    }

    #[test]
    fn test_denied_is_error() {
        let json = r#"{"status":"REQUEST_DENIED","error_message":"bad key","results":[]}"#;
        assert!(matches!(parse(json), Err(ServiceError::Api { .. })));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let geocoder = MapsGeocoder::new(Client::new(), "http://127.0.0.1:9/geocode", None);
        let result = geocoder
            .reverse_geocode(Coordinates {
                latitude: 1.0,
                longitude: 2.0,
            })
            .await;
        assert!(matches!(result, Err(ServiceError::NotConfigured(_))));
    }
}
