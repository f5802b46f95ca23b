use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visitlog::geolocation::ReportedPosition;
use visitlog::selector::{contact_options, filter_sites, ContactOption};
use visitlog::SessionCache;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub email: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// `false` when the browser has no geolocation API at all.
    #[serde(default = "default_true")]
    pub geolocation_supported: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub session: SessionCache,
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let position = if request.geolocation_supported {
        ReportedPosition::from_fields(request.latitude, request.longitude)
    } else {
        ReportedPosition::Unsupported
    };

    let cache = state
        .session_service
        .start(&request.email, &position)
        .await?;
    let session_id = state.open_session(cache.clone()).await;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            session: cache,
        }),
    ))
}

pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.close_session(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::SessionNotFound)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SiteQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SiteMatch {
    pub name: String,
    pub district: String,
    pub state: String,
    pub contacts: Vec<ContactOption>,
}

pub async fn search_sites(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SiteQuery>,
) -> ApiResult<Json<Vec<SiteMatch>>> {
    let cache = state.session(id).await?;
    let matches = filter_sites(cache.sites(), &query.q)
        .into_iter()
        .map(|site| SiteMatch {
            name: site.name.clone(),
            district: site.district.clone(),
            state: site.state.clone(),
            contacts: contact_options(site),
        })
        .collect();
    Ok(Json(matches))
}

#[derive(Debug, Deserialize)]
pub struct DistrictRequest {
    #[serde(default)]
    pub district: Option<String>,
}

pub async fn change_district(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<DistrictRequest>,
) -> ApiResult<Json<SessionCache>> {
    let mut cache = state.session(id).await?;
    state
        .session_service
        .change_district(&mut cache, request.district.as_deref())
        .await?;
    state.replace_session(id, cache.clone()).await?;
    Ok(Json(cache))
}
