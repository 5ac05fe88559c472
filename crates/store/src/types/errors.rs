//! Error types for the store crate.

use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conversation not found: {id}")]
    ConversationNotFound { id: i64 },

    #[error("Contact not found: {id}")]
    ContactNotFound { id: i64 },

    #[error("Inbox not found: {id}")]
    InboxNotFound { id: i64 },

    #[error("User not found: {id}")]
    UserNotFound { id: i64 },
}

impl StoreError {
    pub fn conversation_not_found(id: i64) -> Self {
        Self::ConversationNotFound { id }
    }

    pub fn contact_not_found(id: i64) -> Self {
        Self::ContactNotFound { id }
    }

    pub fn inbox_not_found(id: i64) -> Self {
        Self::InboxNotFound { id }
    }

    pub fn user_not_found(id: i64) -> Self {
        Self::UserNotFound { id }
    }
}
