//! Form aggregate: metadata, settings, attached tracking groups and
//! collected responses.
//!
//! All writes that touch `groups` or `responses` go through the methods on
//! [`Form`] so that the in-memory and the PostgreSQL stores enforce the same
//! invariants on the snapshot they hold the lock for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::DenyReason;
use crate::models::response::{AdmissionPath, ResponseRecord};
use crate::models::tracking::{
    AttachOutcome, RosterDelta, TrackerFlag, TrackerKey, TrackerUpdate, TrackingGroup,
    TrackingProgress,
};
use crate::models::user::User;
use crate::services::eligibility::{self, Decision};
use crate::services::locator::{self, LocateError};

pub const DEFAULT_FORM_NAME: &str = "Untitled Form";
pub const DEFAULT_QUESTION: &str = "Untitled Question";
pub const DEFAULT_OPTION: &str = "Option1";
pub const DEFAULT_FONT: &str = "Roboto";
pub const DEFAULT_CLOSED_MESSAGE: &str = "Form is Closed";
pub const DEFAULT_CONFIRMATION_MESSAGE: &str = "Your response has been recorded";

/// Maximum number of questions on one form.
pub const MAX_QUESTIONS: usize = 200;
/// Maximum number of options on one choice question.
pub const MAX_OPTIONS: usize = 100;

lazy_static::lazy_static! {
    static ref HEX_COLOR_REGEX: regex::Regex = regex::Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap();
}

/// Answer type of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Radio,
    Checkbox,
    Dropdown,
    ShortText,
    Paragraph,
}

impl QuestionKind {
    /// Choice questions must offer at least one option.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            QuestionKind::Radio | QuestionKind::Checkbox | QuestionKind::Dropdown
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Question {
    pub id: Uuid,
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub photo_path: Option<String>,
}

impl Question {
    /// The placeholder question every new form starts with.
    pub fn untitled() -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt: DEFAULT_QUESTION.to_string(),
            kind: QuestionKind::Radio,
            options: vec![DEFAULT_OPTION.to_string()],
            photo_path: None,
        }
    }
}

/// Presentation settings chosen by the creator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FormStyle {
    pub header_font: String,
    pub question_font: String,
    pub text_font: String,
    pub header_image: Option<String>,
    pub color: Option<String>,
    pub transparency_color: Option<String>,
}

impl Default for FormStyle {
    fn default() -> Self {
        Self {
            header_font: DEFAULT_FONT.to_string(),
            question_font: DEFAULT_FONT.to_string(),
            text_font: DEFAULT_FONT.to_string(),
            header_image: None,
            color: None,
            transparency_color: None,
        }
    }
}

/// Creator-owned descriptive part of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FormMetadata {
    pub creator_id: Uuid,
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub style: FormStyle,
    pub created_at: DateTime<Utc>,
    pub last_edited: DateTime<Utc>,
}

/// Replacement payload for `update_metadata`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct FormContent {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: String,

    #[validate(custom(function = "validate_questions"))]
    pub questions: Vec<Question>,

    #[serde(default)]
    #[validate(custom(function = "validate_style"))]
    pub style: FormStyle,
}

fn validate_questions(questions: &[Question]) -> Result<(), ValidationError> {
    if questions.len() > MAX_QUESTIONS {
        let mut err = ValidationError::new("too_many_questions");
        err.message = Some(format!("At most {} questions per form", MAX_QUESTIONS).into());
        return Err(err);
    }

    let mut ids = std::collections::HashSet::new();
    for question in questions {
        if question.prompt.trim().is_empty() {
            let mut err = ValidationError::new("question_prompt_empty");
            err.message = Some("Question text cannot be empty".into());
            return Err(err);
        }
        if !ids.insert(question.id) {
            let mut err = ValidationError::new("question_id_duplicate");
            err.message = Some(format!("Duplicate question id {}", question.id).into());
            return Err(err);
        }
        if question.kind.is_choice() && question.options.is_empty() {
            let mut err = ValidationError::new("question_options_missing");
            err.message = Some("Choice questions need at least one option".into());
            return Err(err);
        }
        if question.options.len() > MAX_OPTIONS {
            let mut err = ValidationError::new("question_options_too_many");
            err.message = Some(format!("At most {} options per question", MAX_OPTIONS).into());
            return Err(err);
        }
    }
    Ok(())
}

fn validate_style(style: &FormStyle) -> Result<(), ValidationError> {
    let colors = [&style.color, &style.transparency_color];
    for color in colors.into_iter().flatten() {
        if !HEX_COLOR_REGEX.is_match(color) {
            let mut err = ValidationError::new("color_format");
            err.message = Some("Colors must be in #rrggbb format".into());
            return Err(err);
        }
    }
    Ok(())
}

/// Admission rules for a form. Replaced as a whole by `update_settings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct FormSettings {
    pub anonymous: bool,
    pub multiple: bool,
    pub editable: bool,
    pub group_gated: bool,
    pub time_bound: bool,
    /// Both bounds are required while `time_bound` is set.
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub limit_responses: bool,
    pub response_limit: u32,
    pub limit_per_user: bool,
    pub per_user_limit: u32,
    pub show_progress_bar: bool,
    pub confirmation_message: String,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            anonymous: true,
            multiple: false,
            editable: false,
            group_gated: false,
            time_bound: false,
            start_time: None,
            end_time: None,
            limit_responses: false,
            response_limit: 0,
            limit_per_user: false,
            per_user_limit: 0,
            show_progress_bar: false,
            confirmation_message: DEFAULT_CONFIRMATION_MESSAGE.to_string(),
        }
    }
}

impl Validate for FormSettings {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.time_bound {
            match (self.start_time, self.end_time) {
                (Some(start), Some(end)) if start > end => {
                    let mut err = ValidationError::new("time_window");
                    err.message = Some("start_time must not be after end_time".into());
                    errors.add("start_time", err);
                }
                (Some(_), Some(_)) => {}
                (start, end) => {
                    let mut err = ValidationError::new("time_window");
                    err.message =
                        Some("start_time and end_time are required when time_bound is set".into());
                    let field = if start.is_none() { "start_time" } else { "end_time" };
                    errors.add(field, err);
                }
            }
        }
        if self.limit_responses && self.response_limit == 0 {
            let mut err = ValidationError::new("response_limit");
            err.message = Some("response_limit must be at least 1 when enabled".into());
            errors.add("response_limit", err);
        }
        if self.limit_per_user && self.per_user_limit == 0 {
            let mut err = ValidationError::new("per_user_limit");
            err.message = Some("per_user_limit must be at least 1 when enabled".into());
            errors.add("per_user_limit", err);
        }
        if self.confirmation_message.chars().count() > 1000 {
            let mut err = ValidationError::new("confirmation_message");
            err.message = Some("Confirmation message must be at most 1000 characters".into());
            errors.add("confirmation_message", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// The form aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Form {
    pub id: Uuid,
    /// Identifier used in public links; never equal to `id`.
    pub url_id: Uuid,
    pub metadata: FormMetadata,
    #[serde(default)]
    pub settings: FormSettings,
    /// Closed switch, kept outside `settings` so a settings replace never
    /// reopens a closed form.
    #[serde(default = "default_accepting")]
    pub accepting: bool,
    #[serde(default = "default_closed_message")]
    pub closed_message: String,
    #[serde(default)]
    pub groups: Vec<TrackingGroup>,
    #[serde(default)]
    pub responses: Vec<ResponseRecord>,
}

fn default_accepting() -> bool {
    true
}

fn default_closed_message() -> String {
    DEFAULT_CLOSED_MESSAGE.to_string()
}

impl Form {
    /// A fresh form with placeholder content, owned by `creator_id`.
    pub fn new(creator_id: Uuid, now: DateTime<Utc>) -> Self {
        let id = Uuid::new_v4();
        let mut url_id = Uuid::new_v4();
        while url_id == id {
            url_id = Uuid::new_v4();
        }

        Self {
            id,
            url_id,
            metadata: FormMetadata {
                creator_id,
                name: DEFAULT_FORM_NAME.to_string(),
                title: DEFAULT_FORM_NAME.to_string(),
                description: String::new(),
                questions: vec![Question::untitled()],
                style: FormStyle::default(),
                created_at: now,
                last_edited: now,
            },
            settings: FormSettings::default(),
            accepting: true,
            closed_message: DEFAULT_CLOSED_MESSAGE.to_string(),
            groups: Vec::new(),
            responses: Vec::new(),
        }
    }

    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.metadata.creator_id == user_id
    }

    /// Number of stored responses attributed to `responder_id`.
    pub fn responses_by(&self, responder_id: Uuid) -> usize {
        self.responses
            .iter()
            .filter(|r| r.responder_id == Some(responder_id))
            .count()
    }

    pub fn tracking_group(&self, group_id: Uuid) -> Option<&TrackingGroup> {
        self.groups.iter().find(|g| g.group_id == group_id)
    }

    pub fn summary(&self) -> FormSummary {
        FormSummary {
            id: self.id,
            url_id: self.url_id,
            name: self.metadata.name.clone(),
            title: self.metadata.title.clone(),
            accepting: self.accepting,
            response_count: self.responses.len(),
            tracking: self.groups.iter().map(TrackingGroup::progress).collect(),
            created_at: self.metadata.created_at,
            last_edited: self.metadata.last_edited,
        }
    }

    /// What a responder gets to see. Never includes responses or trackers.
    pub fn public_view(&self, admitted_via: AdmissionPath) -> FormView {
        FormView {
            url_id: self.url_id,
            title: self.metadata.title.clone(),
            description: self.metadata.description.clone(),
            questions: self.metadata.questions.clone(),
            style: self.metadata.style.clone(),
            show_progress_bar: self.settings.show_progress_bar,
            admitted_via,
        }
    }

    /// Re-runs admission on this snapshot and appends the record if it
    /// still passes, tagged with the path it passed through. Stores call
    /// this while holding the document lock, which is what makes
    /// at-most-once hold under concurrent submissions.
    pub fn admit_response(
        &mut self,
        responder: Option<&User>,
        mut record: ResponseRecord,
        now: DateTime<Utc>,
    ) -> Result<ResponseRecord, DenyReason> {
        match eligibility::evaluate(self, responder, now) {
            Decision::Deny(reason) => Err(reason),
            Decision::Admit(path) => {
                record.admitted_via = path;
                self.responses.push(record.clone());
                Ok(record)
            }
        }
    }

    /// Sets a tracker flag addressed by `(group_id, email)`.
    ///
    /// The position is resolved on this snapshot immediately before the
    /// write and never reused.
    pub fn set_tracker_flag(
        &mut self,
        key: &TrackerKey,
        flag: TrackerFlag,
    ) -> Result<TrackerUpdate, LocateError> {
        let pos = locator::locate(self, key.group_id, &key.email)?;
        let tracker = &mut self.groups[pos.group_index].participants[pos.participant_index];
        if tracker.flag(flag) {
            return Ok(TrackerUpdate::Unchanged);
        }
        tracker.raise(flag);
        Ok(TrackerUpdate::Updated)
    }

    /// Appends a roster snapshot and switches the form to group-gated.
    pub fn attach_group(&mut self, group: TrackingGroup) -> AttachOutcome {
        self.settings.group_gated = true;
        if self.tracking_group(group.group_id).is_some() {
            return AttachOutcome::AlreadyAttached;
        }
        self.groups.push(group);
        AttachOutcome::Attached
    }

    /// Removes every tracking group for `group_id`. Returns whether
    /// anything was removed.
    pub fn detach_group(&mut self, group_id: Uuid) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.group_id != group_id);
        self.groups.len() != before
    }

    /// Adds trackers for `added` and drops trackers for `removed` in the
    /// snapshot for `group_id`. Returns `None` if the group is not attached.
    pub fn reconcile_participants(
        &mut self,
        group_id: Uuid,
        added: &[String],
        removed: &[String],
    ) -> Option<RosterDelta> {
        let group = self.groups.iter_mut().find(|g| g.group_id == group_id)?;
        let removed_count = group.remove_participants(removed);
        let added_count = group.add_participants(added);
        Some(RosterDelta {
            added: added_count,
            removed: removed_count,
        })
    }
}

/// Listing entry for a creator's forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FormSummary {
    pub id: Uuid,
    pub url_id: Uuid,
    pub name: String,
    pub title: String,
    pub accepting: bool,
    pub response_count: usize,
    /// Seen and filled counts per attached group.
    pub tracking: Vec<TrackingProgress>,
    pub created_at: DateTime<Utc>,
    pub last_edited: DateTime<Utc>,
}

/// Responder-facing projection returned by `view`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FormView {
    pub url_id: Uuid,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub style: FormStyle,
    pub show_progress_bar: bool,
    pub admitted_via: AdmissionPath,
}
