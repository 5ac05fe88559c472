//! # Frontdesk Store Crate
//!
//! Entities, repository traits, and the storage backends behind the
//! realtime subsystem: a sqlite implementation for production use and an
//! in-memory implementation for tests and seeding. Business code depends on
//! the traits only.

use anyhow::Context;
use frontdesk_config::DatabaseConfig;
use sqlx::SqlitePool;

pub mod connection;
pub mod entities;
pub mod memory;
pub mod repos;
pub mod types;

pub use connection::{apply_schema, prepare_database};

pub use repos::{
    ContactStore, ConversationStore, InboxStore, SqliteContactStore, SqliteConversationStore,
    SqliteInboxStore, SqliteUserStore, UserStore,
};

pub use entities::{
    Contact, Conversation, ConversationMessage, ConversationStatus, ConversationWithRelations,
    CreateContactRequest, CreateConversationRequest, CreateInboxRequest, CreateMessageRequest,
    CreateUserRequest, Inbox, SenderType, UpdateContactRequest, UpdateConversation, User,
};

pub use memory::{MemoryContactStore, MemoryConversationStore, MemoryInboxStore};

pub use types::{StoreError, StoreResult};

/// Connect and bring the schema up to date.
pub async fn initialize_database(config: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let pool = prepare_database(config)
        .await
        .context("failed to prepare database")?;

    apply_schema(&pool)
        .await
        .context("failed to apply database schema")?;

    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_database() -> (SqlitePool, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let config = DatabaseConfig {
            url: format!("sqlite://{}", db_path.display()),
            max_connections: 1,
        };

        let pool = initialize_database(&config).await.unwrap();
        (pool, temp_dir)
    }

    async fn seed_inbox_and_contact(pool: &SqlitePool) -> (i64, i64) {
        let now = chrono::Utc::now().to_rfc3339();
        let inbox_id = sqlx::query(
            "INSERT INTO inboxes (company_id, name, auto_assignment_enabled, max_auto_assignments, created_at, updated_at) \
             VALUES (1, 'Support', 0, 5, ?, ?)",
        )
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid();

        let contact = SqliteContactStore::new(pool.clone())
            .create(&CreateContactRequest {
                company_id: 1,
                name: Some("Visitor".to_string()),
                email: None,
            })
            .await
            .unwrap();

        (inbox_id, contact.id)
    }

    #[tokio::test]
    async fn conversation_round_trip_through_sqlite() {
        let (pool, _dir) = create_test_database().await;
        let (inbox_id, contact_id) = seed_inbox_and_contact(&pool).await;

        let store = SqliteConversationStore::new(pool.clone());
        let conversation = store
            .create(&CreateConversationRequest {
                company_id: 1,
                inbox_id,
                contact_id,
            })
            .await
            .unwrap();

        assert_eq!(conversation.status, ConversationStatus::Pending);
        assert!(conversation.assigned_to_id.is_none());

        let message = store
            .append_message(&CreateMessageRequest {
                conversation_id: conversation.id,
                sender_type: SenderType::Contact,
                sender_id: Some(contact_id),
                content: "I need help".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(message.conversation_id, conversation.id);

        let updated = store
            .update(
                conversation.id,
                &UpdateConversation {
                    status: Some(ConversationStatus::Active),
                    assigned_to_id: Some(42),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ConversationStatus::Active);
        assert_eq!(updated.assigned_to_id, Some(42));
        assert_eq!(updated.last_message_content.as_deref(), Some("I need help"));

        let with_relations = store
            .get_with_relations(conversation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(with_relations.messages.len(), 1);
        assert_eq!(with_relations.inbox.id, inbox_id);
        assert_eq!(with_relations.contact.id, contact_id);
    }

    #[tokio::test]
    async fn active_assigned_count_filters_status() {
        let (pool, _dir) = create_test_database().await;
        let (inbox_id, contact_id) = seed_inbox_and_contact(&pool).await;

        let store = SqliteConversationStore::new(pool.clone());
        for status in [ConversationStatus::Active, ConversationStatus::Closed] {
            let conversation = store
                .create(&CreateConversationRequest {
                    company_id: 1,
                    inbox_id,
                    contact_id,
                })
                .await
                .unwrap();
            store
                .update(
                    conversation.id,
                    &UpdateConversation {
                        status: Some(status),
                        assigned_to_id: Some(9),
                    },
                )
                .await
                .unwrap();
        }

        assert_eq!(store.active_assigned_count(9).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn inbox_membership_queries() {
        let (pool, _dir) = create_test_database().await;
        let now = chrono::Utc::now().to_rfc3339();

        let inbox_id = sqlx::query(
            "INSERT INTO inboxes (company_id, name, auto_assignment_enabled, max_auto_assignments, created_at, updated_at) \
             VALUES (1, 'Support', 1, 2, ?, ?)",
        )
        .bind(&now)
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        let user_id = sqlx::query(
            "INSERT INTO users (public_id, company_id, display_name, created_at) VALUES (?, 1, 'Ana', ?)",
        )
        .bind(cuid2::create_id())
        .bind(&now)
        .execute(&pool)
        .await
        .unwrap()
        .last_insert_rowid();

        sqlx::query("INSERT INTO inbox_members (inbox_id, user_id) VALUES (?, ?)")
            .bind(inbox_id)
            .bind(user_id)
            .execute(&pool)
            .await
            .unwrap();

        let store = SqliteInboxStore::new(pool.clone());
        let inbox = store.get(inbox_id).await.unwrap().unwrap();
        assert!(inbox.auto_assignment_enabled);
        assert_eq!(inbox.max_auto_assignments, 2);

        let agents = store.agents_with_access(inbox_id).await.unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].display_name, "Ana");

        assert_eq!(
            store.inbox_ids_for_agent(user_id).await.unwrap(),
            vec![inbox_id]
        );
    }
}
