//! Response records and submission payloads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Maximum number of answers in one submission.
pub const MAX_ANSWERS: usize = 500;

/// The rule path a responder was admitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "path", content = "group_id")]
pub enum AdmissionPath {
    /// Matched a participant of an attached group; tracking applies.
    Group(Uuid),
    /// Admitted because the form accepts anonymous responses.
    Anonymous,
}

impl AdmissionPath {
    pub fn group_id(&self) -> Option<Uuid> {
        match self {
            AdmissionPath::Group(id) => Some(*id),
            AdmissionPath::Anonymous => None,
        }
    }

    /// Low-cardinality label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AdmissionPath::Group(_) => "group",
            AdmissionPath::Anonymous => "anonymous",
        }
    }
}

impl fmt::Display for AdmissionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdmissionPath::Group(id) => write!(f, "group:{}", id),
            AdmissionPath::Anonymous => write!(f, "anonymous"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Answer {
    pub question_id: Uuid,
    #[serde(default)]
    pub value: serde_json::Value,
}

/// One stored submission. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResponseRecord {
    pub id: Uuid,
    pub form_id: Uuid,
    /// `None` only for submissions that carried no identity at all.
    pub responder_id: Option<Uuid>,
    #[serde(default)]
    pub answers: Vec<Answer>,
    pub admitted_via: AdmissionPath,
    pub submitted_at: DateTime<Utc>,
}

impl ResponseRecord {
    pub fn new(
        form_id: Uuid,
        responder_id: Option<Uuid>,
        answers: Vec<Answer>,
        admitted_via: AdmissionPath,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            form_id,
            responder_id,
            answers,
            admitted_via,
            submitted_at,
        }
    }
}

/// Request payload for submitting a response.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmitResponseRequest {
    #[serde(default)]
    #[validate(length(max = 500, message = "At most 500 answers per submission"))]
    pub answers: Vec<Answer>,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub record: ResponseRecord,
    pub confirmation_message: String,
}

/// What the submitter gets back. Leaves out the internal form id.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ResponseReceipt {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub admitted_via: AdmissionPath,
    pub confirmation_message: String,
}

impl From<Submission> for ResponseReceipt {
    fn from(s: Submission) -> Self {
        Self {
            id: s.record.id,
            submitted_at: s.record.submitted_at,
            admitted_via: s.record.admitted_via,
            confirmation_message: s.confirmation_message,
        }
    }
}
