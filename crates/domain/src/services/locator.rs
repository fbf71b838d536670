//! Tracking locator.
//!
//! Resolves `(group_id, email)` to a position inside a form's nested
//! tracking structure. A [`TrackerPosition`] is only valid for the
//! snapshot it was computed on; callers resolve again before every write.

use shared::validation::same_email;
use thiserror::Error;
use uuid::Uuid;

use crate::models::form::Form;

/// Index pair into `form.groups[g].participants[p]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerPosition {
    pub group_index: usize,
    pub participant_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("group {0} is not attached to the form")]
    GroupNotFound(Uuid),

    #[error("{email} is not a participant of group {group_id}")]
    ParticipantNotFound { group_id: Uuid, email: String },

    #[error("group {0} is attached more than once")]
    DuplicateGroup(Uuid),

    #[error("{email} is listed more than once in group {group_id}")]
    DuplicateParticipant { group_id: Uuid, email: String },
}

impl LocateError {
    pub fn group_id(&self) -> Uuid {
        match self {
            LocateError::GroupNotFound(id) | LocateError::DuplicateGroup(id) => *id,
            LocateError::ParticipantNotFound { group_id, .. }
            | LocateError::DuplicateParticipant { group_id, .. } => *group_id,
        }
    }
}

/// Finds the unique tracker for `email` in the group `group_id`.
///
/// Ambiguous structure (the group or the e-mail appearing twice) is
/// reported instead of picking one of the rows.
pub fn locate(form: &Form, group_id: Uuid, email: &str) -> Result<TrackerPosition, LocateError> {
    let mut groups = form
        .groups
        .iter()
        .enumerate()
        .filter(|(_, g)| g.group_id == group_id);

    let (group_index, group) = groups.next().ok_or(LocateError::GroupNotFound(group_id))?;
    if groups.next().is_some() {
        return Err(LocateError::DuplicateGroup(group_id));
    }

    let mut rows = group
        .participants
        .iter()
        .enumerate()
        .filter(|(_, t)| same_email(&t.email, email));

    let (participant_index, _) = rows.next().ok_or_else(|| LocateError::ParticipantNotFound {
        group_id,
        email: email.to_string(),
    })?;
    if rows.next().is_some() {
        return Err(LocateError::DuplicateParticipant {
            group_id,
            email: email.to_string(),
        });
    }

    Ok(TrackerPosition {
        group_index,
        participant_index,
    })
}

/// Lists structural anomalies in the form's tracking data.
pub fn find_anomalies(form: &Form) -> Vec<LocateError> {
    let mut anomalies = Vec::new();
    let mut seen_groups = std::collections::HashSet::new();

    for group in &form.groups {
        if !seen_groups.insert(group.group_id) {
            anomalies.push(LocateError::DuplicateGroup(group.group_id));
            continue;
        }
        let mut seen_emails = std::collections::HashSet::new();
        for tracker in &group.participants {
            let email = shared::validation::normalize_email(&tracker.email);
            if !seen_emails.insert(email.clone()) {
                anomalies.push(LocateError::DuplicateParticipant {
                    group_id: group.group_id,
                    email,
                });
            }
        }
    }

    anomalies
}
