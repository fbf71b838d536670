//! External groups and roster change events.

use serde::{Deserialize, Serialize};
use shared::validation::{dedupe_emails, validate_email_list};
use uuid::Uuid;
use validator::Validate;

/// Read-only view of a group owned by the group collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupRoster {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub participant_emails: Vec<String>,
}

/// Roster edit emitted by the group layer.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct MembershipChange {
    #[serde(default)]
    #[validate(custom(function = "validate_email_list"))]
    pub added: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_email_list"))]
    pub removed: Vec<String>,
}

impl MembershipChange {
    /// Normalised add/remove sets. An address present in both is treated
    /// as removed.
    pub fn normalized(&self) -> (Vec<String>, Vec<String>) {
        let removed = dedupe_emails(&self.removed);
        let added = dedupe_emails(&self.added)
            .into_iter()
            .filter(|e| !removed.contains(e))
            .collect();
        (added, removed)
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Outcome of a membership propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PropagationReport {
    pub forms_updated: usize,
    pub trackers_added: usize,
    pub trackers_removed: usize,
}

/// Outcome of a roster re-sync on one form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncReport {
    pub groups_synced: usize,
    pub trackers_added: usize,
    /// Attached groups that no longer exist upstream.
    pub missing_groups: Vec<Uuid>,
}
