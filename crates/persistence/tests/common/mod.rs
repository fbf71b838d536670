//! Shared fixtures: domain services wired to the in-memory ports.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};
use domain::models::{Caller, Form, FormSettings, GroupRoster, SubmitResponseRequest, User};
use domain::ports::{Clock, FixedClock, FormStore, SystemClock};
use domain::services::{
    AdmissionEngine, GroupPropagation, LoggingNotifier, ReminderService, SettingsGate,
};
use fake::faker::name::en::Name;
use fake::Fake;
use persistence::{MemoryFormStore, MemoryGroupDirectory, MemoryReminderStore, MemoryUserDirectory};
use uuid::Uuid;

pub struct Harness {
    pub forms: Arc<MemoryFormStore>,
    pub groups: Arc<MemoryGroupDirectory>,
    pub users: Arc<MemoryUserDirectory>,
    pub reminders: Arc<MemoryReminderStore>,
    pub notifier: Arc<LoggingNotifier>,
    pub engine: Arc<AdmissionEngine>,
    pub gate: SettingsGate,
    pub propagation: GroupPropagation,
    pub reminder_service: ReminderService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let forms = Arc::new(MemoryFormStore::new());
        let groups = Arc::new(MemoryGroupDirectory::new());
        let users = Arc::new(MemoryUserDirectory::new());
        let reminders = Arc::new(MemoryReminderStore::new());
        let notifier = Arc::new(LoggingNotifier::new());

        Self {
            engine: Arc::new(AdmissionEngine::new(
                forms.clone(),
                users.clone(),
                clock.clone(),
            )),
            gate: SettingsGate::new(forms.clone(), clock.clone()),
            propagation: GroupPropagation::new(forms.clone(), groups.clone()),
            reminder_service: ReminderService::new(
                forms.clone(),
                users.clone(),
                reminders.clone(),
                notifier.clone(),
                clock,
            ),
            forms,
            groups,
            users,
            reminders,
            notifier,
        }
    }

    /// An admission engine over the same stores, frozen at `now`.
    pub fn engine_at(&self, now: DateTime<Utc>) -> AdmissionEngine {
        AdmissionEngine::new(
            self.forms.clone(),
            self.users.clone(),
            Arc::new(FixedClock(now)),
        )
    }

    /// An admission engine over a custom form store.
    pub fn engine_over(&self, forms: Arc<dyn FormStore>) -> AdmissionEngine {
        AdmissionEngine::new(forms, self.users.clone(), Arc::new(SystemClock))
    }

    /// Registers an account and returns its caller identity.
    pub async fn user(&self, email: &str) -> Caller {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            display_name: Name().fake(),
        };
        self.users.upsert(user.clone()).await;
        Caller::new(user.id, email)
    }

    pub async fn group(&self, creator: &Caller, emails: &[&str]) -> GroupRoster {
        let roster = GroupRoster {
            id: Uuid::new_v4(),
            creator_id: creator.user_id,
            name: "G1".to_string(),
            participant_emails: emails.iter().map(|e| e.to_string()).collect(),
        };
        self.groups.upsert(roster.clone()).await;
        roster
    }

    /// Creates a form owned by `creator` with the given settings.
    pub async fn form(&self, creator: &Caller, settings: FormSettings) -> Form {
        let form = self.gate.create_form(creator.user_id).await.unwrap();
        self.gate
            .update_settings(form.id, creator.user_id, settings)
            .await
            .unwrap()
    }

    pub async fn reload(&self, form_id: Uuid) -> Form {
        self.forms.find_by_id(form_id).await.unwrap().unwrap()
    }
}

pub fn empty_submission() -> SubmitResponseRequest {
    SubmitResponseRequest { answers: vec![] }
}

/// Settings for a form that only admits members of attached groups.
pub fn group_only() -> FormSettings {
    FormSettings {
        anonymous: false,
        group_gated: true,
        multiple: false,
        ..FormSettings::default()
    }
}
