//! Sqlite-backed inbox repository.

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::entities::{Inbox, User};
use crate::repos::conversation_repository::map_inbox;
use crate::repos::InboxStore;
use crate::types::StoreResult;

pub struct SqliteInboxStore {
    pool: SqlitePool,
}

impl SqliteInboxStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InboxStore for SqliteInboxStore {
    async fn get(&self, id: i64) -> StoreResult<Option<Inbox>> {
        let row = sqlx::query(
            "SELECT id, company_id, name, auto_assignment_enabled, max_auto_assignments, \
             auto_responder_message, created_at, updated_at FROM inboxes WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_inbox).transpose()?)
    }

    async fn agents_with_access(&self, inbox_id: i64) -> StoreResult<Vec<User>> {
        let rows = sqlx::query(
            r#"
            SELECT u.id, u.public_id, u.company_id, u.display_name, u.email, u.created_at
            FROM users u
            JOIN inbox_members im ON im.user_id = u.id
            WHERE im.inbox_id = ?
            ORDER BY u.id ASC
            "#,
        )
        .bind(inbox_id)
        .fetch_all(&self.pool)
        .await?;

        let users = rows
            .iter()
            .map(map_user)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn inbox_ids_for_agent(&self, user_id: i64) -> StoreResult<Vec<i64>> {
        let ids: Vec<i64> =
            sqlx::query_scalar("SELECT inbox_id FROM inbox_members WHERE user_id = ? ORDER BY inbox_id")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(ids)
    }
}

fn map_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        company_id: row.try_get("company_id")?,
        display_name: row.try_get("display_name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
    })
}
