//! Group roster entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the form_groups table.
#[derive(Debug, Clone, FromRow)]
pub struct FormGroupEntity {
    pub id: Uuid,
    pub creator_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub participant_emails: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FormGroupEntity> for domain::models::GroupRoster {
    fn from(entity: FormGroupEntity) -> Self {
        Self {
            id: entity.id,
            creator_id: entity.creator_id,
            name: entity.name,
            participant_emails: entity.participant_emails,
        }
    }
}
