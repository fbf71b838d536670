//! Reminder entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the reminders table.
#[derive(Debug, Clone, FromRow)]
pub struct ReminderEntity {
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

impl From<ReminderEntity> for domain::models::Reminder {
    fn from(entity: ReminderEntity) -> Self {
        Self {
            id: entity.id,
            recipient_id: entity.recipient_id,
            form_id: entity.form_id,
            group_id: entity.group_id,
            group_name: entity.group_name,
            sender_name: entity.sender_name,
            message: entity.message,
            seen: entity.seen,
            created_at: entity.created_at,
        }
    }
}
