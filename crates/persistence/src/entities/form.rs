//! Form entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::Form;
use domain::StoreError;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the forms table. The aggregate lives in
/// `document`; the other columns are indexed copies.
#[derive(Debug, Clone, FromRow)]
pub struct FormEntity {
    pub id: Uuid,
    pub url_id: Uuid,
    pub creator_id: Uuid,
    pub document: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FormEntity> for Form {
    type Error = StoreError;

    fn try_from(entity: FormEntity) -> Result<Self, Self::Error> {
        let mut form: Form = serde_json::from_value(entity.document)
            .map_err(|e| StoreError::Backend(format!("corrupt form document {}: {}", entity.id, e)))?;
        // Columns are authoritative for the identifiers.
        form.id = entity.id;
        form.url_id = entity.url_id;
        Ok(form)
    }
}

/// Serialises a form into its stored document.
pub fn to_document(form: &Form) -> Result<serde_json::Value, StoreError> {
    serde_json::to_value(form).map_err(|e| StoreError::Backend(e.to_string()))
}
