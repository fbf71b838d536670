//! Group roster repository (read-only).

use async_trait::async_trait;
use domain::models::GroupRoster;
use domain::ports::GroupDirectory;
use domain::StoreError;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::FormGroupEntity;
use crate::error::map_sqlx;
use crate::metrics::QueryTimer;

/// Repository for participant group rosters.
#[derive(Clone)]
pub struct FormGroupRepository {
    pool: PgPool,
}

impl FormGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupDirectory for FormGroupRepository {
    async fn find_group(&self, group_id: Uuid) -> Result<Option<GroupRoster>, StoreError> {
        let timer = QueryTimer::new("find_form_group");
        let result = sqlx::query_as::<_, FormGroupEntity>(
            r#"
            SELECT id, creator_id, name, description, participant_emails, created_at
            FROM form_groups
            WHERE id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_sqlx)?.map(Into::into))
    }
}
