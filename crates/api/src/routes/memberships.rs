//! Membership-change events emitted by the group management service.

use axum::{
    extract::{Path, State},
    Json,
};
use domain::models::{MembershipChange, PropagationReport};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;

/// Apply `{added, removed}` to every form tracking the group.
///
/// POST /api/v1/groups/:group_id/membership-events
///
/// Only the group's creator may emit events. Replaying an event is
/// harmless.
pub async fn membership_event(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Json(change): Json<MembershipChange>,
) -> Result<Json<PropagationReport>, ApiError> {
    let report = state
        .propagation
        .apply_membership_event(group_id, user_auth.user_id, &change)
        .await?;

    info!(
        group_id = %group_id,
        forms_updated = report.forms_updated,
        "Membership change propagated"
    );

    Ok(Json(report))
}
