//! Sqlite-backed contact repository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::entities::{Contact, CreateContactRequest, UpdateContactRequest};
use crate::repos::conversation_repository::map_contact;
use crate::repos::ContactStore;
use crate::types::{StoreError, StoreResult};

pub struct SqliteContactStore {
    pool: SqlitePool,
}

impl SqliteContactStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64) -> StoreResult<Option<Contact>> {
        let row = sqlx::query(
            "SELECT id, public_id, company_id, name, email, created_at, updated_at \
             FROM contacts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(map_contact).transpose()?)
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn create(&self, request: &CreateContactRequest) -> StoreResult<Contact> {
        let public_id = cuid2::create_id();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO contacts (public_id, company_id, name, email, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(request.company_id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.fetch(id)
            .await?
            .ok_or(StoreError::ContactNotFound { id })
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Contact>> {
        self.fetch(id).await
    }

    async fn update(&self, id: i64, request: &UpdateContactRequest) -> StoreResult<Contact> {
        let now = chrono::Utc::now().to_rfc3339();

        if let Some(ref name) = request.name {
            sqlx::query("UPDATE contacts SET name = ?, updated_at = ? WHERE id = ?")
                .bind(name)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        if let Some(ref email) = request.email {
            sqlx::query("UPDATE contacts SET email = ?, updated_at = ? WHERE id = ?")
                .bind(email)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        self.fetch(id)
            .await?
            .ok_or(StoreError::ContactNotFound { id })
    }
}
