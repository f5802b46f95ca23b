use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use visitlog::imaging::decode_data_url;
use visitlog::pipeline::{LogProgress, SUCCESS_MESSAGE};
use visitlog::VisitForm;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitVisitRequest {
    #[serde(flatten)]
    pub form: VisitForm,
    /// Captured photo as a `data:image/...;base64,` URL.
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitVisitResponse {
    pub submission_id: String,
    pub message: &'static str,
    /// The form should be cleared for the next visit.
    pub reset_form: bool,
    pub address: String,
    pub photo_url: String,
    pub follow_up_scheduled: bool,
}

pub async fn submit_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SubmitVisitRequest>,
) -> ApiResult<Json<SubmitVisitResponse>> {
    let session = state.session(id).await?;

    let mut form = request.form;
    if let Some(photo) = request.photo.as_deref().filter(|p| !p.trim().is_empty()) {
        let raw = decode_data_url(photo)?;
        let normalizer = state.normalizer.clone();
        let normalized = tokio::task::spawn_blocking(move || normalizer.normalize(&raw))
            .await
            .map_err(|e| crate::error::ApiError::Internal(format!("photo task failed: {e}")))??;
        form.photo = Some(normalized);
    }

    let draft = form.validate(&session, state.local_offset)?;
    let progress = LogProgress::new(session.email());
    let receipt = state.pipeline.submit(draft, &progress).await?;

    Ok(Json(SubmitVisitResponse {
        submission_id: receipt.submission_id,
        message: SUCCESS_MESSAGE,
        reset_form: true,
        address: receipt.address.as_text().to_string(),
        photo_url: receipt.photo_url.as_text().to_string(),
        follow_up_scheduled: receipt.follow_up_scheduled,
    }))
}
