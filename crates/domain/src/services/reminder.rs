//! Reminder service.
//!
//! A form creator nudges the participants of an attached group. One
//! reminder is stored per recipient with an account; delivery is handed to
//! the notifier without waiting for it.

use std::sync::Arc;

use shared::validation::{dedupe_emails, normalize_email};
use uuid::Uuid;
use validator::Validate;

use crate::error::{DomainError, Resource};
use crate::models::reminder::{Reminder, ReminderDispatch, ReminderReport, SendReminderRequest};
use crate::models::user::Caller;
use crate::ports::{Clock, FormStore, ReminderStore, UserDirectory};
use crate::services::notification::{NotificationResult, ReminderNotifier};

pub struct ReminderService {
    forms: Arc<dyn FormStore>,
    users: Arc<dyn UserDirectory>,
    reminders: Arc<dyn ReminderStore>,
    notifier: Arc<dyn ReminderNotifier>,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    pub fn new(
        forms: Arc<dyn FormStore>,
        users: Arc<dyn UserDirectory>,
        reminders: Arc<dyn ReminderStore>,
        notifier: Arc<dyn ReminderNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            forms,
            users,
            reminders,
            notifier,
            clock,
        }
    }

    pub async fn send(
        &self,
        caller: &Caller,
        request: SendReminderRequest,
    ) -> Result<ReminderReport, DomainError> {
        request.validate()?;

        let form = self
            .forms
            .find_by_id(request.form_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Form))?;
        if !form.is_creator(caller.user_id) {
            return Err(DomainError::NotAuthorized(
                "Only the form creator can send reminders".into(),
            ));
        }
        let group = form
            .tracking_group(request.group_id)
            .ok_or(DomainError::NotFound(Resource::Group))?;

        let mut report = ReminderReport::default();
        let targets: Vec<String> = if request.participants.is_empty() {
            group.pending().map(|t| t.email.clone()).collect()
        } else {
            dedupe_emails(&request.participants)
                .into_iter()
                .filter(|email| {
                    let tracked = group.contains(email);
                    if !tracked {
                        report.skipped.push(email.clone());
                    }
                    tracked
                })
                .collect()
        };

        let sender_name = match self.users.find_by_email(&caller.email).await? {
            Some(user) => user.display_name,
            None => caller.email.clone(),
        };
        let now = self.clock.now();

        let mut reminders = Vec::with_capacity(targets.len());
        let mut recipients = Vec::with_capacity(targets.len());
        for email in targets {
            match self.users.find_by_email(&email).await? {
                Some(user) => {
                    reminders.push(Reminder {
                        id: Uuid::new_v4(),
                        recipient_id: user.id,
                        form_id: form.id,
                        group_id: group.group_id,
                        group_name: group.group_name.clone(),
                        sender_name: sender_name.clone(),
                        message: request.message.clone(),
                        seen: false,
                        created_at: now,
                    });
                    recipients.push(normalize_email(&user.email));
                }
                None => report.skipped.push(email),
            }
        }

        self.reminders.insert_many(&reminders).await?;
        report.created = reminders.len();

        tracing::info!(
            form_id = %form.id,
            group_id = %group.group_id,
            created = report.created,
            skipped = report.skipped.len(),
            "Reminders created"
        );

        let dispatch = ReminderDispatch {
            form_id: form.id,
            group_id: group.group_id,
            message: request.message,
            recipients,
        };
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            let form_id = dispatch.form_id;
            if let NotificationResult::Failed(reason) = notifier.notify(dispatch).await {
                tracing::warn!(form_id = %form_id, reason = %reason, "Reminder notification failed");
            }
        });

        Ok(report)
    }

    /// Reminders addressed to the requester, newest first.
    pub async fn list(&self, requester: Uuid) -> Result<Vec<Reminder>, DomainError> {
        Ok(self.reminders.list_for_recipient(requester).await?)
    }

    pub async fn mark_seen(&self, id: Uuid, requester: Uuid) -> Result<(), DomainError> {
        self.set_seen(id, requester, true).await
    }

    pub async fn mark_unseen(&self, id: Uuid, requester: Uuid) -> Result<(), DomainError> {
        self.set_seen(id, requester, false).await
    }

    pub async fn delete(&self, id: Uuid, requester: Uuid) -> Result<(), DomainError> {
        self.load_own(id, requester).await?;
        if !self.reminders.delete(id).await? {
            return Err(DomainError::NotFound(Resource::Reminder));
        }
        tracing::debug!(reminder_id = %id, "Reminder deleted");
        Ok(())
    }

    async fn set_seen(&self, id: Uuid, requester: Uuid, seen: bool) -> Result<(), DomainError> {
        self.load_own(id, requester).await?;
        if !self.reminders.set_seen(id, seen).await? {
            return Err(DomainError::NotFound(Resource::Reminder));
        }
        Ok(())
    }

    async fn load_own(&self, id: Uuid, requester: Uuid) -> Result<Reminder, DomainError> {
        let reminder = self
            .reminders
            .find(id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Reminder))?;
        if reminder.recipient_id != requester {
            return Err(DomainError::NotAuthorized(
                "Reminder belongs to another user".into(),
            ));
        }
        Ok(reminder)
    }
}
