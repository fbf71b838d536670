//! Creator-side form routes: create, list, edit, open/close.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{Form, FormContent, FormSettings, FormSummary};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub accepting: bool,
}

/// Create a form with default content and settings.
///
/// POST /api/v1/forms
pub async fn create_form(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<(StatusCode, Json<Form>), ApiError> {
    let form = state.gate.create_form(user_auth.user_id).await?;

    info!(form_id = %form.id, user_id = %user_auth.user_id, "Form created");

    Ok((StatusCode::CREATED, Json(form)))
}

/// List the caller's forms, newest first.
///
/// GET /api/v1/forms
pub async fn list_forms(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<Vec<FormSummary>>, ApiError> {
    Ok(Json(state.gate.list_forms(user_auth.user_id).await?))
}

/// Fetch the full form for editing. Creator only.
///
/// GET /api/v1/forms/:form_id
pub async fn get_form(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(form_id): Path<Uuid>,
) -> Result<Json<Form>, ApiError> {
    Ok(Json(state.gate.get_form(form_id, user_auth.user_id).await?))
}

/// Replace name, title, description, questions and style.
///
/// PUT /api/v1/forms/:form_id/metadata
pub async fn update_metadata(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(form_id): Path<Uuid>,
    Json(content): Json<FormContent>,
) -> Result<Json<Form>, ApiError> {
    let form = state
        .gate
        .update_metadata(form_id, user_auth.user_id, content)
        .await?;
    Ok(Json(form))
}

/// Replace the admission settings. Never changes the open/closed switch.
///
/// PUT /api/v1/forms/:form_id/settings
pub async fn update_settings(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(form_id): Path<Uuid>,
    Json(settings): Json<FormSettings>,
) -> Result<Json<Form>, ApiError> {
    let form = state
        .gate
        .update_settings(form_id, user_auth.user_id, settings)
        .await?;
    Ok(Json(form))
}

/// Flip the accepting switch.
///
/// POST /api/v1/forms/:form_id/status
pub async fn toggle_status(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(form_id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    let accepting = state
        .gate
        .toggle_accepting(form_id, user_auth.user_id)
        .await?;

    info!(form_id = %form_id, accepting, "Form status toggled");

    Ok(Json(StatusResponse { accepting }))
}
