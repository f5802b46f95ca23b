use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use visitlog::AuthStatus;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn status(State(state): State<AppState>) -> Json<AuthStatus> {
    Json(state.tokens.status())
}

/// Revokes the external token and clears the persisted copy.
pub async fn sign_out(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.tokens.sign_out().await?;
    log::info!("Signed out of the external services");
    Ok(Json(json!({ "status": state.tokens.status() })))
}
