//! Form repository: PostgreSQL document store for form aggregates.
//!
//! Every read-modify-write runs in one transaction holding the row lock
//! (`SELECT ... FOR UPDATE`), so admission and tracker positions are always
//! re-resolved on the snapshot being written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::models::tracking::{TrackerFlag, TrackerKey, TrackerUpdate};
use domain::models::{Form, ResponseRecord, User};
use domain::ports::{Admission, FormMutation, FormStore, MutationOutcome};
use domain::services::locator;
use domain::StoreError;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::entities::form::{to_document, FormEntity};
use crate::error::{map_commit, map_sqlx};
use crate::metrics::{record_lock_wait, QueryTimer};

const FORM_COLUMNS: &str = "id, url_id, creator_id, document, created_at, updated_at";

/// Repository for form documents.
#[derive(Clone)]
pub struct FormRepository {
    pool: PgPool,
}

impl FormRepository {
    /// Creates a new FormRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn lock(
        tx: &mut Transaction<'_, Postgres>,
        form_id: Uuid,
    ) -> Result<Form, StoreError> {
        let timer = QueryTimer::new("lock_form");
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            "SELECT {} FROM forms WHERE id = $1 FOR UPDATE",
            FORM_COLUMNS
        ))
        .bind(form_id)
        .fetch_optional(&mut **tx)
        .await;
        record_lock_wait(timer.elapsed());
        timer.record();

        let entity = result.map_err(map_sqlx)?.ok_or(StoreError::NotFound)?;
        Form::try_from(entity)
    }

    async fn find_one(
        &self,
        column: &str,
        value: Uuid,
        query_name: &'static str,
    ) -> Result<Option<Form>, StoreError> {
        let timer = QueryTimer::new(query_name);
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            "SELECT {} FROM forms WHERE {} = $1",
            FORM_COLUMNS, column
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result.map_err(map_sqlx)?.map(Form::try_from).transpose()
    }
}

#[async_trait]
impl FormStore for FormRepository {
    async fn insert(&self, form: &Form) -> Result<(), StoreError> {
        let timer = QueryTimer::new("insert_form");
        let result = sqlx::query(
            r#"
            INSERT INTO forms (id, url_id, creator_id, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(form.id)
        .bind(form.url_id)
        .bind(form.metadata.creator_id)
        .bind(to_document(form)?)
        .bind(form.metadata.created_at)
        .execute(&self.pool)
        .await;
        timer.record();

        if result.map_err(map_sqlx)?.rows_affected() != 1 {
            return Err(StoreError::Unacknowledged);
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Form>, StoreError> {
        self.find_one("id", id, "find_form_by_id").await
    }

    async fn find_by_url_id(&self, url_id: Uuid) -> Result<Option<Form>, StoreError> {
        self.find_one("url_id", url_id, "find_form_by_url_id").await
    }

    async fn list_by_creator(&self, creator_id: Uuid) -> Result<Vec<Form>, StoreError> {
        let timer = QueryTimer::new("list_forms_by_creator");
        let result = sqlx::query_as::<_, FormEntity>(&format!(
            "SELECT {} FROM forms WHERE creator_id = $1 ORDER BY created_at DESC",
            FORM_COLUMNS
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();

        result
            .map_err(map_sqlx)?
            .into_iter()
            .map(Form::try_from)
            .collect()
    }

    async fn forms_tracking_group(&self, group_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let timer = QueryTimer::new("forms_tracking_group");
        let probe = serde_json::json!({ "groups": [{ "group_id": group_id }] });
        let result = sqlx::query_scalar::<_, Uuid>("SELECT id FROM forms WHERE document @> $1")
            .bind(Json(probe))
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result.map_err(map_sqlx)
    }

    async fn append_response(
        &self,
        form_id: Uuid,
        responder: Option<&User>,
        record: ResponseRecord,
        now: DateTime<Utc>,
    ) -> Result<Admission, StoreError> {
        let timer = QueryTimer::new("append_response");
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let mut form = Self::lock(&mut tx, form_id).await?;
        let record = match form.admit_response(responder, record, now) {
            Ok(record) => record,
            Err(reason) => {
                tx.rollback().await.map_err(map_sqlx)?;
                timer.record();
                return Ok(Admission::Denied(reason));
            }
        };

        let result = sqlx::query(
            r#"
            UPDATE forms
            SET document = jsonb_set(
                    document,
                    '{responses}',
                    COALESCE(document->'responses', '[]'::jsonb) || jsonb_build_array($2::jsonb)
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(form_id)
        .bind(Json(&record))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() != 1 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(StoreError::Unacknowledged);
        }

        tx.commit().await.map_err(map_commit)?;
        timer.record();
        Ok(Admission::Recorded(record))
    }

    async fn set_tracker_flag(
        &self,
        form_id: Uuid,
        key: &TrackerKey,
        flag: TrackerFlag,
    ) -> Result<TrackerUpdate, StoreError> {
        let timer = QueryTimer::new("set_tracker_flag");
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let form = Self::lock(&mut tx, form_id).await?;
        let pos = match locator::locate(&form, key.group_id, &key.email) {
            Ok(pos) => pos,
            Err(e) => {
                tracing::debug!(form_id = %form_id, error = %e, "Tracker not locatable");
                tx.rollback().await.map_err(map_sqlx)?;
                return Ok(TrackerUpdate::NoMatch);
            }
        };
        if form.groups[pos.group_index].participants[pos.participant_index].flag(flag) {
            tx.rollback().await.map_err(map_sqlx)?;
            return Ok(TrackerUpdate::Unchanged);
        }

        let row = |leaf: &str| -> Vec<String> {
            vec![
                "groups".to_string(),
                pos.group_index.to_string(),
                "participants".to_string(),
                pos.participant_index.to_string(),
                leaf.to_string(),
            ]
        };

        // The e-mail predicate guards the positional path against renumbering.
        let result = sqlx::query(
            r#"
            UPDATE forms
            SET document = jsonb_set(document, $2::text[], 'true'::jsonb),
                updated_at = NOW()
            WHERE id = $1 AND LOWER(document #>> $3::text[]) = $4
            "#,
        )
        .bind(form_id)
        .bind(row(flag.field()))
        .bind(row("email"))
        .bind(&key.email)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx)?;

        if result.rows_affected() == 0 {
            tx.rollback().await.map_err(map_sqlx)?;
            timer.record();
            return Ok(TrackerUpdate::NoMatch);
        }

        tx.commit().await.map_err(map_commit)?;
        timer.record();
        Ok(TrackerUpdate::Updated)
    }

    async fn apply(&self, form_id: Uuid, mutation: FormMutation) -> Result<MutationOutcome, StoreError> {
        let timer = QueryTimer::new("apply_form_mutation");
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;

        let mut form = Self::lock(&mut tx, form_id).await?;
        let outcome = mutation.apply(&mut form);

        let result = sqlx::query("UPDATE forms SET document = $2, updated_at = NOW() WHERE id = $1")
            .bind(form_id)
            .bind(to_document(&form)?)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

        if result.rows_affected() != 1 {
            tx.rollback().await.map_err(map_sqlx)?;
            return Err(StoreError::Unacknowledged);
        }

        tx.commit().await.map_err(map_commit)?;
        timer.record();
        Ok(outcome)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx)
    }
}
