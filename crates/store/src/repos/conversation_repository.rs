//! Sqlite-backed conversation repository.

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;

use crate::entities::{
    Contact, Conversation, ConversationMessage, ConversationStatus, ConversationWithRelations,
    CreateConversationRequest, CreateMessageRequest, Inbox, SenderType, UpdateConversation,
};
use crate::repos::ConversationStore;
use crate::types::{StoreError, StoreResult};

const CONVERSATION_COLUMNS: &str = "id, public_id, company_id, inbox_id, contact_id, status, \
     assigned_to_id, last_message_content, last_message_at, created_at, updated_at";

pub struct SqliteConversationStore {
    pool: SqlitePool,
}

impl SqliteConversationStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64) -> StoreResult<Option<Conversation>> {
        let row = sqlx::query(&format!(
            "SELECT {CONVERSATION_COLUMNS} FROM conversations WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_conversation).transpose().map_err(StoreError::from)
    }
}

#[async_trait]
impl ConversationStore for SqliteConversationStore {
    async fn create(&self, request: &CreateConversationRequest) -> StoreResult<Conversation> {
        let public_id = cuid2::create_id();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO conversations
                (public_id, company_id, inbox_id, contact_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(request.company_id)
        .bind(request.inbox_id)
        .bind(request.contact_id)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(conversation_id = id, inbox_id = request.inbox_id, "conversation created");

        self.fetch(id)
            .await?
            .ok_or(StoreError::ConversationNotFound { id })
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Conversation>> {
        self.fetch(id).await
    }

    async fn get_with_relations(&self, id: i64) -> StoreResult<Option<ConversationWithRelations>> {
        let Some(conversation) = self.fetch(id).await? else {
            return Ok(None);
        };

        let contact_row = sqlx::query(
            "SELECT id, public_id, company_id, name, email, created_at, updated_at \
             FROM contacts WHERE id = ?",
        )
        .bind(conversation.contact_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::ContactNotFound {
            id: conversation.contact_id,
        })?;

        let inbox_row = sqlx::query(
            "SELECT id, company_id, name, auto_assignment_enabled, max_auto_assignments, \
             auto_responder_message, created_at, updated_at FROM inboxes WHERE id = ?",
        )
        .bind(conversation.inbox_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::InboxNotFound {
            id: conversation.inbox_id,
        })?;

        let message_rows = sqlx::query(
            "SELECT id, public_id, conversation_id, sender_type, sender_id, content, created_at \
             FROM messages WHERE conversation_id = ? ORDER BY id ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let messages = message_rows
            .iter()
            .map(map_message)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(ConversationWithRelations {
            conversation,
            contact: map_contact(&contact_row)?,
            inbox: map_inbox(&inbox_row)?,
            messages,
        }))
    }

    async fn update(&self, id: i64, changes: &UpdateConversation) -> StoreResult<Conversation> {
        let now = chrono::Utc::now().to_rfc3339();

        if let Some(status) = changes.status {
            sqlx::query("UPDATE conversations SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        if let Some(agent_id) = changes.assigned_to_id {
            sqlx::query("UPDATE conversations SET assigned_to_id = ?, updated_at = ? WHERE id = ?")
                .bind(agent_id)
                .bind(&now)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        self.fetch(id)
            .await?
            .ok_or(StoreError::ConversationNotFound { id })
    }

    async fn active_assigned_count(&self, agent_id: i64) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM conversations WHERE assigned_to_id = ? AND status = 'active'",
        )
        .bind(agent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn append_message(
        &self,
        request: &CreateMessageRequest,
    ) -> StoreResult<ConversationMessage> {
        let public_id = cuid2::create_id();
        let now = chrono::Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (public_id, conversation_id, sender_type, sender_id, content, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&public_id)
        .bind(request.conversation_id)
        .bind(request.sender_type.as_str())
        .bind(request.sender_id)
        .bind(&request.content)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "UPDATE conversations SET last_message_content = ?, last_message_at = ?, updated_at = ? \
             WHERE id = ?",
        )
        .bind(&request.content)
        .bind(&now)
        .bind(&now)
        .bind(request.conversation_id)
        .execute(&self.pool)
        .await?;

        Ok(ConversationMessage {
            id: result.last_insert_rowid(),
            public_id,
            conversation_id: request.conversation_id,
            sender_type: request.sender_type,
            sender_id: request.sender_id,
            content: request.content.clone(),
            created_at: now,
        })
    }
}

fn map_conversation(row: &SqliteRow) -> Result<Conversation, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Conversation {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        company_id: row.try_get("company_id")?,
        inbox_id: row.try_get("inbox_id")?,
        contact_id: row.try_get("contact_id")?,
        status: ConversationStatus::from(status.as_str()),
        assigned_to_id: row.try_get("assigned_to_id")?,
        last_message_content: row.try_get("last_message_content")?,
        last_message_at: row.try_get("last_message_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_message(row: &SqliteRow) -> Result<ConversationMessage, sqlx::Error> {
    let sender_type: String = row.try_get("sender_type")?;
    Ok(ConversationMessage {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        conversation_id: row.try_get("conversation_id")?,
        sender_type: SenderType::from(sender_type.as_str()),
        sender_id: row.try_get("sender_id")?,
        content: row.try_get("content")?,
        created_at: row.try_get("created_at")?,
    })
}

pub(crate) fn map_contact(row: &SqliteRow) -> Result<Contact, sqlx::Error> {
    Ok(Contact {
        id: row.try_get("id")?,
        public_id: row.try_get("public_id")?,
        company_id: row.try_get("company_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

pub(crate) fn map_inbox(row: &SqliteRow) -> Result<Inbox, sqlx::Error> {
    Ok(Inbox {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        name: row.try_get("name")?,
        auto_assignment_enabled: row.try_get("auto_assignment_enabled")?,
        max_auto_assignments: row.try_get("max_auto_assignments")?,
        auto_responder_message: row.try_get("auto_responder_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
