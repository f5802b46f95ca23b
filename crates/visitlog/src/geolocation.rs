//! Geolocation acquisition. The browser owns the actual prompt; the service
//! only sees what the client reported.

use async_trait::async_trait;

use crate::error::GeolocationError;
use crate::model::Coordinates;

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Position reported by the client alongside a request.
#[derive(Debug, Clone)]
pub enum ReportedPosition {
    Granted(Coordinates),
    Denied,
    Unsupported,
}

impl ReportedPosition {
    /// Interprets optional latitude/longitude fields from a request body.
    /// Out-of-range or non-finite values count as a denied prompt.
    pub fn from_fields(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        match (latitude, longitude) {
            (Some(lat), Some(lon))
                if lat.is_finite()
                    && lon.is_finite()
                    && (-90.0..=90.0).contains(&lat)
                    && (-180.0..=180.0).contains(&lon) =>
            {
                ReportedPosition::Granted(Coordinates {
                    latitude: lat,
                    longitude: lon,
                })
            }
            _ => ReportedPosition::Denied,
        }
    }
}

#[async_trait]
impl PositionSource for ReportedPosition {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        match self {
            ReportedPosition::Granted(coords) => Ok(*coords),
            ReportedPosition::Denied => Err(GeolocationError::Denied),
            ReportedPosition::Unsupported => Err(GeolocationError::Unsupported),
        }
    }
}
