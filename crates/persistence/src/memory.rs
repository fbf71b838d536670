//! In-memory implementation of every port.
//!
//! Backs the `memory` storage backend and the test suites. Forms are locked
//! one at a time, the way the PostgreSQL store locks one row, and every
//! write runs the same `Form` methods under that lock. The other stores
//! keep their documents behind one `tokio::sync::RwLock`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::tracking::{TrackerFlag, TrackerKey, TrackerUpdate};
use domain::models::{Form, GroupRoster, Reminder, ResponseRecord, User};
use domain::ports::{
    Admission, FormMutation, FormStore, GroupDirectory, MutationOutcome, ReminderStore,
    UserDirectory,
};
use domain::StoreError;
use shared::validation::{normalize_email, same_email};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Forms keyed by id, each behind its own lock.
///
/// The outer lock only guards the index. Writers hold a single form's
/// mutex, so edits to different forms never wait on each other.
#[derive(Debug, Default)]
pub struct MemoryFormStore {
    index: RwLock<FormIndex>,
}

#[derive(Debug, Default)]
struct FormIndex {
    by_id: HashMap<Uuid, Arc<Mutex<Form>>>,
    by_url: HashMap<Uuid, Uuid>,
}

impl MemoryFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.index.read().await.by_id.is_empty()
    }

    async fn slot(&self, id: Uuid) -> Option<Arc<Mutex<Form>>> {
        self.index.read().await.by_id.get(&id).cloned()
    }

    async fn slots(&self) -> Vec<Arc<Mutex<Form>>> {
        self.index.read().await.by_id.values().cloned().collect()
    }

    async fn snapshot(slot: Option<Arc<Mutex<Form>>>) -> Option<Form> {
        match slot {
            Some(slot) => Some(slot.lock().await.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl FormStore for MemoryFormStore {
    async fn insert(&self, form: &Form) -> Result<(), StoreError> {
        let mut index = self.index.write().await;
        if index.by_id.contains_key(&form.id) || index.by_url.contains_key(&form.url_id) {
            return Err(StoreError::Conflict(format!("form {} already exists", form.id)));
        }
        index.by_url.insert(form.url_id, form.id);
        index
            .by_id
            .insert(form.id, Arc::new(Mutex::new(form.clone())));
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Form>, StoreError> {
        Ok(Self::snapshot(self.slot(id).await).await)
    }

    async fn find_by_url_id(&self, url_id: Uuid) -> Result<Option<Form>, StoreError> {
        let slot = {
            let index = self.index.read().await;
            index
                .by_url
                .get(&url_id)
                .and_then(|id| index.by_id.get(id))
                .cloned()
        };
        Ok(Self::snapshot(slot).await)
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Form>, StoreError> {
        let mut forms = Vec::new();
        for slot in self.slots().await {
            let form = slot.lock().await;
            if form.is_creator(creator_id) {
                forms.push(form.clone());
            }
        }
        forms.sort_by(|a, b| b.metadata.created_at.cmp(&a.metadata.created_at));
        Ok(forms)
    }

    async fn forms_tracking_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let mut ids = Vec::new();
        for slot in self.slots().await {
            let form = slot.lock().await;
            if form.tracking_group(group_id).is_some() {
                ids.push(form.id);
            }
        }
        Ok(ids)
    }

    async fn append_response(
        &self,
        form_id: Uuid,
        responder: Option<&User>,
        record: ResponseRecord,
        now: DateTime<Utc>,
    ) -> Result<Admission, StoreError> {
        let slot = self.slot(form_id).await.ok_or(StoreError::NotFound)?;
        let mut form = slot.lock().await;
        Ok(match form.admit_response(responder, record, now) {
            Ok(record) => Admission::Recorded(record),
            Err(reason) => Admission::Denied(reason),
        })
    }

    async fn set_tracker_flag(
        &self,
        form_id: Uuid,
        key: &TrackerKey,
        flag: TrackerFlag,
    ) -> Result<TrackerUpdate, StoreError> {
        let slot = self.slot(form_id).await.ok_or(StoreError::NotFound)?;
        let mut form = slot.lock().await;
        match form.set_tracker_flag(key, flag) {
            Ok(update) => Ok(update),
            Err(e) => {
                tracing::debug!(form_id = %form_id, error = %e, "Tracker not locatable");
                Ok(TrackerUpdate::NoMatch)
            }
        }
    }

    async fn apply(&self, form_id: Uuid, mutation: FormMutation) -> Result<MutationOutcome, StoreError> {
        let slot = self.slot(form_id).await.ok_or(StoreError::NotFound)?;
        let mut form = slot.lock().await;
        Ok(mutation.apply(&mut form))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Group rosters, seeded by tests or by whoever embeds the memory backend.
#[derive(Debug, Default)]
pub struct MemoryGroupDirectory {
    groups: RwLock<HashMap<Uuid, GroupRoster>>,
}

impl MemoryGroupDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, roster: GroupRoster) {
        self.groups.write().await.insert(roster.id, roster);
    }

    pub async fn remove(&self, group_id: Uuid) -> Option<GroupRoster> {
        self.groups.write().await.remove(&group_id)
    }
}

#[async_trait]
impl GroupDirectory for MemoryGroupDirectory {
    async fn find_group(&self, group_id: Uuid) -> Result<Option<GroupRoster>, StoreError> {
        Ok(self.groups.read().await.get(&group_id).cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserDirectory {
    users: RwLock<Vec<User>>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the user with the same id.
    pub async fn upsert(&self, user: User) {
        let mut users = self.users.write().await;
        users.retain(|u| u.id != user.id);
        users.push(User {
            email: normalize_email(&user.email),
            ..user
        });
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|u| same_email(&u.email, email))
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct MemoryReminderStore {
    reminders: RwLock<HashMap<Uuid, Reminder>>,
}

impl MemoryReminderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReminderStore for MemoryReminderStore {
    async fn insert_many(&self, reminders: &[Reminder]) -> Result<(), StoreError> {
        let mut store = self.reminders.write().await;
        for r in reminders {
            store.insert(r.id, r.clone());
        }
        Ok(())
    }

    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Reminder>, StoreError> {
        let mut list: Vec<Reminder> = self
            .reminders
            .read()
            .await
            .values()
            .filter(|r| r.recipient_id == recipient_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Reminder>, StoreError> {
        Ok(self.reminders.read().await.get(&id).cloned())
    }

    async fn set_seen(&self, id: Uuid, seen: bool) -> Result<bool, StoreError> {
        match self.reminders.write().await.get_mut(&id) {
            Some(r) => {
                r.seen = seen;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.reminders.write().await.remove(&id).is_some())
    }
}
