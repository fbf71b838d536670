//! Responder-facing routes, addressed by the form's public url id.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{FormView, ResponseReceipt, SubmitResponseRequest};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OptionalUserAuth;

/// GET /api/v1/f/:url_id
///
/// Anonymous callers are allowed. Group-admitted callers are marked as
/// having seen the form.
pub async fn view_form(
    State(state): State<AppState>,
    auth: OptionalUserAuth,
    Path(url_id): Path<Uuid>,
) -> Result<Json<FormView>, ApiError> {
    let caller = auth.caller();
    Ok(Json(state.engine.view(url_id, caller.as_ref()).await?))
}

/// POST /api/v1/f/:url_id/responses
pub async fn submit_response(
    State(state): State<AppState>,
    auth: OptionalUserAuth,
    Path(url_id): Path<Uuid>,
    Json(request): Json<SubmitResponseRequest>,
) -> Result<(StatusCode, Json<ResponseReceipt>), ApiError> {
    let caller = auth.caller();
    let submission = state.engine.submit(url_id, caller.as_ref(), request).await?;
    Ok((StatusCode::CREATED, Json(submission.into())))
}
