//! Status and settings gate.
//!
//! Creator-only lifecycle operations on a form. The eligibility evaluator
//! reads what this service writes.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::{DomainError, Resource};
use crate::models::form::{Form, FormContent, FormSettings, FormSummary};
use crate::ports::{Clock, FormMutation, FormStore, MutationOutcome};

pub struct SettingsGate {
    forms: Arc<dyn FormStore>,
    clock: Arc<dyn Clock>,
}

impl SettingsGate {
    pub fn new(forms: Arc<dyn FormStore>, clock: Arc<dyn Clock>) -> Self {
        Self { forms, clock }
    }

    pub async fn create_form(&self, requester: Uuid) -> Result<Form, DomainError> {
        let form = Form::new(requester, self.clock.now());
        self.forms.insert(&form).await?;
        tracing::info!(form_id = %form.id, creator_id = %requester, "Form created");
        Ok(form)
    }

    /// Summaries of the requester's forms, newest first.
    pub async fn list_forms(&self, requester: Uuid) -> Result<Vec<FormSummary>, DomainError> {
        let forms = self.forms.list_by_creator(requester).await?;
        Ok(forms.iter().map(Form::summary).collect())
    }

    pub async fn get_form(&self, form_id: Uuid, requester: Uuid) -> Result<Form, DomainError> {
        self.load_owned(form_id, requester).await
    }

    /// Flips the closed switch and returns the new `accepting` state.
    pub async fn toggle_accepting(&self, form_id: Uuid, requester: Uuid) -> Result<bool, DomainError> {
        self.load_owned(form_id, requester).await?;
        match self
            .forms
            .apply(form_id, FormMutation::ToggleAccepting)
            .await?
        {
            MutationOutcome::Accepting(accepting) => {
                tracing::info!(form_id = %form_id, accepting, "Form status changed");
                Ok(accepting)
            }
            other => Err(DomainError::Store(format!(
                "unexpected mutation outcome: {:?}",
                other
            ))),
        }
    }

    /// Replaces the settings sub-document as sent. Ownership is checked
    /// before the payload is judged.
    pub async fn update_settings(
        &self,
        form_id: Uuid,
        requester: Uuid,
        settings: FormSettings,
    ) -> Result<Form, DomainError> {
        self.load_owned(form_id, requester).await?;
        settings.validate()?;

        let mutation = FormMutation::ReplaceSettings {
            settings,
            edited_at: self.clock.now(),
        };
        self.forms.apply(form_id, mutation).await?;
        tracing::info!(form_id = %form_id, "Form settings updated");
        self.reload(form_id).await
    }

    /// Replaces title, description, questions and style.
    pub async fn update_metadata(
        &self,
        form_id: Uuid,
        requester: Uuid,
        content: FormContent,
    ) -> Result<Form, DomainError> {
        self.load_owned(form_id, requester).await?;
        content.validate()?;

        let mutation = FormMutation::ReplaceContent {
            content,
            edited_at: self.clock.now(),
        };
        self.forms.apply(form_id, mutation).await?;
        tracing::info!(form_id = %form_id, "Form metadata updated");
        self.reload(form_id).await
    }

    async fn load_owned(&self, form_id: Uuid, requester: Uuid) -> Result<Form, DomainError> {
        let form = self.reload(form_id).await?;
        if !form.is_creator(requester) {
            return Err(DomainError::NotAuthorized(
                "Only the form creator can do this".into(),
            ));
        }
        Ok(form)
    }

    async fn reload(&self, form_id: Uuid) -> Result<Form, DomainError> {
        self.forms
            .find_by_id(form_id)
            .await?
            .ok_or(DomainError::NotFound(Resource::Form))
    }
}
