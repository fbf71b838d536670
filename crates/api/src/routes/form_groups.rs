//! Attaching groups to forms and re-syncing their rosters.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::tracking::AttachOutcome;
use domain::models::SyncReport;
use serde::Serialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

#[derive(Debug, Serialize)]
pub struct AttachResponse {
    pub attached: bool,
    /// The group was already tracked; nothing changed.
    pub already_attached: bool,
}

#[derive(Debug, Serialize)]
pub struct DetachResponse {
    pub detached: bool,
}

/// Snapshot a group's roster into the form and make the form group-gated.
///
/// PUT /api/v1/forms/:form_id/groups/:group_id
///
/// Requester must own both the form and the group.
pub async fn attach_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((form_id, group_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<AttachResponse>, ApiError> {
    let outcome = state
        .propagation
        .attach_group(form_id, group_id, user_auth.user_id)
        .await?;

    Ok(Json(AttachResponse {
        attached: true,
        already_attached: outcome == AttachOutcome::AlreadyAttached,
    }))
}

/// Stop tracking a group. Detaching an unattached group succeeds.
///
/// DELETE /api/v1/forms/:form_id/groups/:group_id
pub async fn detach_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((form_id, group_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DetachResponse>, ApiError> {
    let detached = state
        .propagation
        .detach_group(form_id, group_id, user_auth.user_id)
        .await?;
    Ok(Json(DetachResponse { detached }))
}

/// POST /api/v1/forms/:form_id/groups/sync
pub async fn sync_rosters(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(form_id): Path<Uuid>,
) -> Result<Json<SyncReport>, ApiError> {
    Ok(Json(
        state
            .propagation
            .sync_rosters(form_id, user_auth.user_id)
            .await?,
    ))
}
