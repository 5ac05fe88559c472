//! Sqlite-backed user repository.

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::entities::User;
use crate::repos::UserStore;
use crate::types::StoreResult;

pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn get(&self, id: i64) -> StoreResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, public_id, company_id, display_name, email, created_at \
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(User {
            id: row.try_get("id")?,
            public_id: row.try_get("public_id")?,
            company_id: row.try_get("company_id")?,
            display_name: row.try_get("display_name")?,
            email: row.try_get("email")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}
