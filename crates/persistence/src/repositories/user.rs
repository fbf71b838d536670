//! User directory repository (read-only).

use async_trait::async_trait;
use domain::models::User;
use domain::ports::UserDirectory;
use domain::StoreError;
use shared::validation::normalize_email;
use sqlx::PgPool;

use crate::entities::UserEntity;
use crate::error::map_sqlx;
use crate::metrics::QueryTimer;

/// Repository for user lookups.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, display_name, created_at
            FROM users
            WHERE LOWER(email) = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        Ok(result.map_err(map_sqlx)?.map(Into::into))
    }
}
