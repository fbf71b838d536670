//! Response admission engine.
//!
//! `submit` is two-phase. Phase one appends the response under the form's
//! document lock and must succeed or the call fails. Phase two raises the
//! responder's tracker flag; it is best-effort and a miss is only logged
//! and counted.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::{DenyReason, DomainError, Resource};
use crate::models::form::{Form, FormView};
use crate::models::response::{AdmissionPath, ResponseRecord, Submission, SubmitResponseRequest};
use crate::models::tracking::{TrackerFlag, TrackerKey, TrackerUpdate};
use crate::models::user::{Caller, User};
use crate::ports::{Admission, Clock, FormStore, UserDirectory};
use crate::services::eligibility::{self, Decision};

pub struct AdmissionEngine {
    forms: Arc<dyn FormStore>,
    users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
}

impl AdmissionEngine {
    pub fn new(
        forms: Arc<dyn FormStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            forms,
            users,
            clock,
        }
    }

    /// Records a response on the form published under `url_id`.
    pub async fn submit(
        &self,
        url_id: Uuid,
        caller: Option<&Caller>,
        request: SubmitResponseRequest,
    ) -> Result<Submission, DomainError> {
        validator::Validate::validate(&request)?;

        let form = self.load(url_id).await?;
        let responder = self.resolve_responder(caller).await?;
        let now = self.clock.now();

        if let Decision::Deny(reason) = eligibility::evaluate(&form, responder.as_ref(), now) {
            return Err(deny(&form, reason));
        }

        let record = ResponseRecord::new(
            form.id,
            responder.as_ref().map(|u| u.id),
            request.answers,
            AdmissionPath::Anonymous,
            now,
        );

        let record = match self
            .forms
            .append_response(form.id, responder.as_ref(), record, now)
            .await?
        {
            Admission::Recorded(record) => record,
            // Lost a race against a concurrent submission or a settings edit.
            Admission::Denied(reason) => return Err(deny(&form, reason)),
        };

        metrics::counter!("responses_recorded_total", "path" => record.admitted_via.kind())
            .increment(1);
        tracing::info!(
            form_id = %form.id,
            response_id = %record.id,
            path = %record.admitted_via,
            "Response recorded"
        );

        if let (AdmissionPath::Group(group_id), Some(user)) = (record.admitted_via, &responder) {
            self.raise_flag(form.id, group_id, &user.email, TrackerFlag::Filled)
                .await;
        }

        Ok(Submission {
            record,
            confirmation_message: form.settings.confirmation_message.clone(),
        })
    }

    /// Returns the responder-facing view of a form and marks the caller's
    /// tracker as seen when admitted through a group.
    pub async fn view(&self, url_id: Uuid, caller: Option<&Caller>) -> Result<FormView, DomainError> {
        let form = self.load(url_id).await?;
        let responder = self.resolve_responder(caller).await?;

        let path = match eligibility::evaluate(&form, responder.as_ref(), self.clock.now()) {
            Decision::Admit(path) => path,
            Decision::Deny(reason) => return Err(deny(&form, reason)),
        };

        if let (AdmissionPath::Group(group_id), Some(user)) = (path, &responder) {
            self.raise_flag(form.id, group_id, &user.email, TrackerFlag::Seen)
                .await;
        }

        Ok(form.public_view(path))
    }

    async fn load(&self, url_id: Uuid) -> Result<Form, DomainError> {
        self.forms
            .find_by_url_id(url_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Form))
    }

    async fn resolve_responder(&self, caller: Option<&Caller>) -> Result<Option<User>, DomainError> {
        let Some(caller) = caller else {
            return Ok(None);
        };
        let user = self
            .users
            .find_by_email(&caller.email)
            .await?
            .unwrap_or_else(|| caller.as_user());
        Ok(Some(user))
    }

    /// Raises `flag` on one tracker. Fails with `TrackingDesync` when the
    /// key resolves to nothing on the locked snapshot.
    pub async fn flag_tracker(
        &self,
        form_id: Uuid,
        key: &TrackerKey,
        flag: TrackerFlag,
    ) -> Result<TrackerUpdate, DomainError> {
        match self.forms.set_tracker_flag(form_id, key, flag).await? {
            TrackerUpdate::NoMatch => Err(DomainError::TrackingDesync {
                group_id: key.group_id,
                email: key.email.clone(),
            }),
            update => Ok(update),
        }
    }

    /// Best-effort tracker write. Never fails the caller.
    async fn raise_flag(&self, form_id: Uuid, group_id: Uuid, email: &str, flag: TrackerFlag) {
        let key = TrackerKey::new(group_id, email);
        match self.flag_tracker(form_id, &key, flag).await {
            Ok(TrackerUpdate::Updated) => {
                tracing::debug!(
                    form_id = %form_id,
                    group_id = %group_id,
                    flag = flag.field(),
                    "Tracker flag raised"
                );
            }
            Ok(_) => {}
            Err(e) => {
                metrics::counter!("tracking_desync_total", "flag" => flag.field()).increment(1);
                tracing::warn!(
                    form_id = %form_id,
                    group_id = %group_id,
                    email = %key.email,
                    flag = flag.field(),
                    error = %e,
                    "Tracker update failed"
                );
            }
        }
    }
}

fn deny(form: &Form, reason: DenyReason) -> DomainError {
    metrics::counter!("admission_denied_total", "reason" => reason.code()).increment(1);
    tracing::debug!(form_id = %form.id, reason = reason.code(), "Admission denied");

    match reason {
        DenyReason::FormClosed(_) => DomainError::Eligibility {
            reason,
            message: form.closed_message.clone(),
        },
        _ => DomainError::denied(reason),
    }
}
