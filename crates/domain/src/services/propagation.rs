//! Group propagation service.
//!
//! The only writer allowed to reconcile a form's tracking snapshots with
//! the group collaborator's rosters after attach time.

use std::sync::Arc;

use shared::validation::{dedupe_emails, same_email};
use uuid::Uuid;
use validator::Validate;

use crate::error::{DomainError, Resource, StoreError};
use crate::models::form::Form;
use crate::models::group::{GroupRoster, MembershipChange, PropagationReport, SyncReport};
use crate::models::tracking::{AttachOutcome, TrackingGroup};
use crate::ports::{FormMutation, FormStore, GroupDirectory, MutationOutcome};

pub struct GroupPropagation {
    forms: Arc<dyn FormStore>,
    groups: Arc<dyn GroupDirectory>,
}

impl GroupPropagation {
    pub fn new(forms: Arc<dyn FormStore>, groups: Arc<dyn GroupDirectory>) -> Self {
        Self { forms, groups }
    }

    /// Snapshots the group's roster into the form.
    ///
    /// The requester must own both the form and the group.
    pub async fn attach_group(
        &self,
        form_id: Uuid,
        group_id: Uuid,
        requester: Uuid,
    ) -> Result<AttachOutcome, DomainError> {
        let form = self.load_form(form_id).await?;
        let group = self.load_group(group_id).await?;

        if !form.is_creator(requester) || group.creator_id != requester {
            return Err(DomainError::NotAuthorized(
                "Only the owner of both the form and the group can attach it".into(),
            ));
        }

        let snapshot = TrackingGroup::snapshot(&group);
        let participants = snapshot.participants.len();
        let outcome = match self
            .forms
            .apply(form_id, FormMutation::AttachGroup(snapshot))
            .await?
        {
            MutationOutcome::Attach(outcome) => outcome,
            other => return Err(unexpected(other)),
        };

        tracing::info!(
            form_id = %form_id,
            group_id = %group_id,
            participants,
            outcome = ?outcome,
            "Group attached"
        );
        Ok(outcome)
    }

    /// Removes the group's snapshot. Succeeds when it is already absent.
    pub async fn detach_group(
        &self,
        form_id: Uuid,
        group_id: Uuid,
        requester: Uuid,
    ) -> Result<bool, DomainError> {
        let form = self.load_form(form_id).await?;
        if !form.is_creator(requester) {
            return Err(DomainError::NotAuthorized(
                "Only the form creator can detach groups".into(),
            ));
        }

        match self
            .forms
            .apply(form_id, FormMutation::DetachGroup(group_id))
            .await?
        {
            MutationOutcome::Detached(removed) => {
                tracing::info!(form_id = %form_id, group_id = %group_id, removed, "Group detached");
                Ok(removed)
            }
            other => Err(unexpected(other)),
        }
    }

    /// Applies a roster edit to every form tracking `group_id`.
    ///
    /// Safe to re-run with the same sets after a partial failure: inserts
    /// and deletes are guarded by membership checks on each snapshot.
    pub async fn propagate_membership_change(
        &self,
        group_id: Uuid,
        change: &MembershipChange,
    ) -> Result<PropagationReport, DomainError> {
        change.validate()?;
        let (added, removed) = change.normalized();
        let mut report = PropagationReport::default();
        if added.is_empty() && removed.is_empty() {
            return Ok(report);
        }

        for form_id in self.forms.forms_tracking_group(group_id).await? {
            let mutation = FormMutation::ReconcileParticipants {
                group_id,
                added: added.clone(),
                removed: removed.clone(),
            };
            match self.forms.apply(form_id, mutation).await {
                Ok(MutationOutcome::Reconciled(Some(delta))) => {
                    report.forms_updated += 1;
                    report.trackers_added += delta.added;
                    report.trackers_removed += delta.removed;
                }
                // Detached or deleted between listing and locking.
                Ok(MutationOutcome::Reconciled(None)) | Err(StoreError::NotFound) => {}
                Ok(other) => return Err(unexpected(other)),
                Err(e) => return Err(e.into()),
            }
        }

        tracing::info!(
            group_id = %group_id,
            forms_updated = report.forms_updated,
            trackers_added = report.trackers_added,
            trackers_removed = report.trackers_removed,
            "Membership change propagated"
        );
        Ok(report)
    }

    /// Entry point for membership events emitted over HTTP. Only the group's
    /// creator may emit them.
    pub async fn apply_membership_event(
        &self,
        group_id: Uuid,
        requester: Uuid,
        change: &MembershipChange,
    ) -> Result<PropagationReport, DomainError> {
        let group = self.load_group(group_id).await?;
        if group.creator_id != requester {
            return Err(DomainError::NotAuthorized(
                "Only the group creator can change its membership".into(),
            ));
        }
        self.propagate_membership_change(group_id, change).await
    }

    /// Adds trackers for roster members that joined after attach time.
    /// Never removes rows. Groups that no longer exist are reported.
    pub async fn sync_rosters(&self, form_id: Uuid, requester: Uuid) -> Result<SyncReport, DomainError> {
        let form = self.load_form(form_id).await?;
        if !form.is_creator(requester) {
            return Err(DomainError::NotAuthorized(
                "Only the form creator can sync rosters".into(),
            ));
        }

        let mut report = SyncReport::default();
        for tracking in &form.groups {
            let Some(roster) = self.groups.find_group(tracking.group_id).await? else {
                report.missing_groups.push(tracking.group_id);
                continue;
            };

            let added: Vec<String> = dedupe_emails(&roster.participant_emails)
                .into_iter()
                .filter(|e| !tracking.participants.iter().any(|t| same_email(&t.email, e)))
                .collect();
            if added.is_empty() {
                report.groups_synced += 1;
                continue;
            }

            let mutation = FormMutation::ReconcileParticipants {
                group_id: tracking.group_id,
                added,
                removed: Vec::new(),
            };
            if let MutationOutcome::Reconciled(Some(delta)) =
                self.forms.apply(form_id, mutation).await?
            {
                report.groups_synced += 1;
                report.trackers_added += delta.added;
            }
        }

        if !report.missing_groups.is_empty() {
            tracing::warn!(
                form_id = %form_id,
                missing = report.missing_groups.len(),
                "Attached groups no longer exist"
            );
        }
        Ok(report)
    }

    async fn load_form(&self, form_id: Uuid) -> Result<Form, DomainError> {
        self.forms
            .find_by_id(form_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Form))
    }

    async fn load_group(&self, group_id: Uuid) -> Result<GroupRoster, DomainError> {
        self.groups
            .find_group(group_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Group))
    }
}

fn unexpected(outcome: MutationOutcome) -> DomainError {
    DomainError::Store(format!("unexpected mutation outcome: {:?}", outcome))
}
