//! Reminder repository.

use async_trait::async_trait;
use domain::models::Reminder;
use domain::ports::ReminderStore;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::ReminderEntity;
use crate::error::{map_commit, map_sqlx};
use crate::metrics::QueryTimer;

const REMINDER_COLUMNS: &str =
    "id, recipient_id, form_id, group_id, group_name, sender_name, message, seen, created_at";

/// Repository for reminder documents.
#[derive(Clone)]
pub struct ReminderRepository {
    pool: PgPool,
}

impl ReminderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderStore for ReminderRepository {
    async fn insert_many(&self, reminders: &[Reminder]) -> Result<(), StoreError> {
        if reminders.is_empty() {
            return Ok(());
        }

        let timer = QueryTimer::new("insert_reminders");
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        for r in reminders {
            sqlx::query(
                r#"
                INSERT INTO reminders
                    (id, recipient_id, form_id, group_id, group_name, sender_name, message, seen, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(r.id)
            .bind(r.recipient_id)
            .bind(r.form_id)
            .bind(r.group_id)
            .bind(&r.group_name)
            .bind(&r.sender_name)
            .bind(&r.message)
            .bind(r.seen)
            .bind(r.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;
        }
        tx.commit().await.map_err(map_commit)?;
        timer.record();
        Ok(())
    }

    async fn list_for_recipient(&self, recipient_id: Uuid) -> Result<Vec<Reminder>, StoreError> {
        let timer = QueryTimer::new("list_reminders_for_recipient");
        let result = sqlx::query_as::<_, ReminderEntity>(&format!(
            "SELECT {} FROM reminders WHERE recipient_id = $1 ORDER BY created_at DESC",
            REMINDER_COLUMNS
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        Ok(result
            .map_err(map_sqlx)?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Reminder>, StoreError> {
        let timer = QueryTimer::new("find_reminder");
        let result = sqlx::query_as::<_, ReminderEntity>(&format!(
            "SELECT {} FROM reminders WHERE id = $1",
            REMINDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_sqlx)?.map(Into::into))
    }

    async fn set_seen(&self, id: Uuid, seen: bool) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("set_reminder_seen");
        let result = sqlx::query("UPDATE reminders SET seen = $2 WHERE id = $1")
            .bind(id)
            .bind(seen)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result.map_err(map_sqlx)?.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("delete_reminder");
        let result = sqlx::query("DELETE FROM reminders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.record();
        Ok(result.map_err(map_sqlx)?.rows_affected() > 0)
    }
}
