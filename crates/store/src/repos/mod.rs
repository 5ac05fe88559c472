//! Repository traits and their implementations.
//!
//! The realtime subsystem only ever talks to these traits; whether the rows
//! live in sqlite or in memory is the caller's wiring decision.

pub mod contact_repository;
pub mod conversation_repository;
pub mod inbox_repository;
pub mod user_repository;

pub use contact_repository::SqliteContactStore;
pub use conversation_repository::SqliteConversationStore;
pub use inbox_repository::SqliteInboxStore;
pub use user_repository::SqliteUserStore;

use async_trait::async_trait;

use crate::entities::{
    Contact, Conversation, ConversationMessage, ConversationWithRelations, CreateContactRequest,
    CreateConversationRequest, CreateMessageRequest, Inbox, UpdateContactRequest,
    UpdateConversation, User,
};
use crate::types::StoreResult;

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn create(&self, request: &CreateConversationRequest) -> StoreResult<Conversation>;

    async fn get(&self, id: i64) -> StoreResult<Option<Conversation>>;

    async fn get_with_relations(&self, id: i64) -> StoreResult<Option<ConversationWithRelations>>;

    /// Apply a change-set; `None` fields are left untouched. Returns the
    /// updated conversation.
    async fn update(&self, id: i64, changes: &UpdateConversation) -> StoreResult<Conversation>;

    /// Number of `active`-status conversations currently assigned to the
    /// agent. Pending, closed and resolved conversations never count.
    async fn active_assigned_count(&self, agent_id: i64) -> StoreResult<i64>;

    /// Persist a message and refresh the conversation's last-message cache
    /// in the same call.
    async fn append_message(
        &self,
        request: &CreateMessageRequest,
    ) -> StoreResult<ConversationMessage>;
}

#[async_trait]
pub trait InboxStore: Send + Sync {
    async fn get(&self, id: i64) -> StoreResult<Option<Inbox>>;

    /// Agents that may work conversations of this inbox.
    async fn agents_with_access(&self, inbox_id: i64) -> StoreResult<Vec<User>>;

    /// Inverse of `agents_with_access`: the inbox ids a given agent may
    /// work. Used to compute a connection's access scope.
    async fn inbox_ids_for_agent(&self, user_id: i64) -> StoreResult<Vec<i64>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: i64) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn create(&self, request: &CreateContactRequest) -> StoreResult<Contact>;

    async fn get(&self, id: i64) -> StoreResult<Option<Contact>>;

    async fn update(&self, id: i64, request: &UpdateContactRequest) -> StoreResult<Contact>;
}
