//! Outbound ports.
//!
//! Services depend on these traits only. `persistence` provides a
//! PostgreSQL and an in-memory implementation of each.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DenyReason, StoreError};
use crate::models::form::{Form, FormContent, FormSettings};
use crate::models::group::GroupRoster;
use crate::models::reminder::Reminder;
use crate::models::response::ResponseRecord;
use crate::models::tracking::{
    AttachOutcome, RosterDelta, TrackerFlag, TrackerKey, TrackerUpdate, TrackingGroup,
};
use crate::models::user::User;

/// Outcome of an atomic admit-and-append.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Recorded(ResponseRecord),
    /// Admission failed when re-checked on the locked document.
    Denied(DenyReason),
}

/// Structural edit applied to a form under the document lock.
#[derive(Debug, Clone)]
pub enum FormMutation {
    ToggleAccepting,
    ReplaceSettings {
        settings: FormSettings,
        edited_at: DateTime<Utc>,
    },
    ReplaceContent {
        content: FormContent,
        edited_at: DateTime<Utc>,
    },
    AttachGroup(TrackingGroup),
    DetachGroup(Uuid),
    ReconcileParticipants {
        group_id: Uuid,
        added: Vec<String>,
        removed: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Accepting(bool),
    Edited,
    Attach(AttachOutcome),
    Detached(bool),
    /// `None` when the group is not attached to the form.
    Reconciled(Option<RosterDelta>),
}

impl FormMutation {
    /// Applies the edit to a locked snapshot.
    pub fn apply(self, form: &mut Form) -> MutationOutcome {
        match self {
            FormMutation::ToggleAccepting => {
                form.accepting = !form.accepting;
                MutationOutcome::Accepting(form.accepting)
            }
            FormMutation::ReplaceSettings {
                settings,
                edited_at,
            } => {
                form.settings = settings;
                form.metadata.last_edited = edited_at;
                MutationOutcome::Edited
            }
            FormMutation::ReplaceContent { content, edited_at } => {
                let meta = &mut form.metadata;
                meta.name = content.name;
                meta.title = content.title;
                meta.description = content.description;
                meta.questions = content.questions;
                meta.style = content.style;
                meta.last_edited = edited_at;
                MutationOutcome::Edited
            }
            FormMutation::AttachGroup(group) => MutationOutcome::Attach(form.attach_group(group)),
            FormMutation::DetachGroup(group_id) => {
                MutationOutcome::Detached(form.detach_group(group_id))
            }
            FormMutation::ReconcileParticipants {
                group_id,
                added,
                removed,
            } => MutationOutcome::Reconciled(form.reconcile_participants(
                group_id, &added, &removed,
            )),
        }
    }
}

/// Document store for form aggregates.
///
/// Every write method is atomic per form: the implementation locks the
/// document, applies the change to the freshly read snapshot and persists
/// it before releasing the lock.
#[async_trait]
pub trait FormStore: Send + Sync {
    async fn insert(&self, form: &Form) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Form>, StoreError>;

    async fn find_by_url_id(&self, url_id: Uuid) -> Result<Option<Form>, StoreError>;

    /// Forms created by `creator_id`, newest first.
    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Form>, StoreError>;

    /// Ids of forms holding a tracking group for `group_id`.
    async fn forms_tracking_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError>;

    /// Re-evaluates admission on the locked document and appends `record`
    /// if it still passes.
    async fn append_response(
        &self,
        form_id: Uuid,
        responder: Option<&User>,
        record: ResponseRecord,
        now: DateTime<Utc>,
    ) -> Result<Admission, StoreError>;

    /// Raises `flag` on the tracker addressed by `key`. The position is
    /// resolved inside the write; an unresolvable key yields `NoMatch`.
    async fn set_tracker_flag(
        &self,
        form_id: Uuid,
        key: &TrackerKey,
        flag: TrackerFlag,
    ) -> Result<TrackerUpdate, StoreError>;

    /// Applies `mutation` and returns its outcome. `StoreError::NotFound`
    /// when the form does not exist.
    async fn apply(
        &self,
        form_id: Uuid,
        mutation: FormMutation,
    ) -> Result<MutationOutcome, StoreError>;

    /// Cheap reachability probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Read-only access to groups owned by the group collaborator.
#[async_trait]
pub trait GroupDirectory: Send + Sync {
    async fn find_group(&self, group_id: Uuid) -> Result<Option<GroupRoster>, StoreError>;
}

/// Read-only access to the identity collaborator.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn insert_many(&self, reminders: &[Reminder]) -> Result<(), StoreError>;

    /// Reminders addressed to `recipient_id`, newest first.
    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Reminder>, StoreError>;

    async fn find(&self, id: Uuid) -> Result<Option<Reminder>, StoreError>;

    /// Returns false when no reminder has that id.
    async fn set_seen(&self, id: Uuid, seen: bool) -> Result<bool, StoreError>;

    /// Returns false when no reminder has that id.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Source of the current time, injectable for window tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
