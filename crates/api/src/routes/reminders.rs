//! Reminder routes: creators send, recipients read and manage.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{Reminder, ReminderReport, SendReminderRequest};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// POST /api/v1/reminders
pub async fn send_reminder(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<SendReminderRequest>,
) -> Result<(StatusCode, Json<ReminderReport>), ApiError> {
    let report = state.reminders.send(&user_auth.caller(), request).await?;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/reminders
pub async fn list_reminders(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<Vec<Reminder>>, ApiError> {
    Ok(Json(state.reminders.list(user_auth.user_id).await?))
}

/// PUT /api/v1/reminders/:reminder_id/seen
pub async fn mark_seen(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(reminder_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .reminders
        .mark_seen(reminder_id, user_auth.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/reminders/:reminder_id/unseen
pub async fn mark_unseen(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(reminder_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .reminders
        .mark_unseen(reminder_id, user_auth.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/reminders/:reminder_id
pub async fn delete_reminder(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(reminder_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.reminders.delete(reminder_id, user_auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
