//! Reminders sent by a form creator to a group's participants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::validate_email_list;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_REMINDER_MESSAGE: &str = "New Form Added into The Group";

/// One reminder delivered to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Reminder {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub form_id: Uuid,
    pub group_id: Uuid,
    pub group_name: String,
    pub sender_name: String,
    pub message: String,
    pub seen: bool,
    pub created_at: DateTime<Utc>,
}

/// Request payload for sending reminders.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SendReminderRequest {
    pub form_id: Uuid,
    pub group_id: Uuid,

    #[validate(length(min = 1, max = 1000, message = "Message must be 1-1000 characters"))]
    pub message: String,

    /// Explicit recipients. Empty means every participant that has not
    /// filled the form yet.
    #[serde(default)]
    #[validate(custom(function = "validate_email_list"))]
    pub participants: Vec<String>,
}

/// Payload handed to the notification collaborator.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReminderDispatch {
    pub form_id: Uuid,
    pub group_id: Uuid,
    pub message: String,
    pub recipients: Vec<String>,
}

/// Result of a send.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ReminderReport {
    pub created: usize,
    /// Requested e-mails that are not trackers of the group or have no
    /// account.
    pub skipped: Vec<String>,
}
