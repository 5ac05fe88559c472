//! Error types for conversation operations.

use frontdesk_store::StoreError;
use thiserror::Error;

pub type ConversationResult<T> = Result<T, ConversationError>;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Conversation not found: {id}")]
    ConversationNotFound { id: i64 },

    #[error("Conversation is closed")]
    ConversationClosed,

    #[error("Inbox not found: {id}")]
    InboxNotFound { id: i64 },

    #[error("Contact not found: {id}")]
    ContactNotFound { id: i64 },

    #[error("Conversation is already assigned to this agent")]
    AlreadyAssigned,

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl ConversationError {
    pub fn conversation_not_found(id: i64) -> Self {
        Self::ConversationNotFound { id }
    }

    pub fn inbox_not_found(id: i64) -> Self {
        Self::InboxNotFound { id }
    }

    pub fn contact_not_found(id: i64) -> Self {
        Self::ContactNotFound { id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Stable error code carried in `connection_error` frames.
    pub fn code(&self) -> &'static str {
        match self {
            ConversationError::Store(_) => "store_error",
            ConversationError::ConversationNotFound { .. } => "conversation_not_found",
            ConversationError::ConversationClosed => "conversation_closed",
            ConversationError::InboxNotFound { .. } => "inbox_not_found",
            ConversationError::ContactNotFound { .. } => "contact_not_found",
            ConversationError::AlreadyAssigned => "already_assigned",
            ConversationError::Validation { .. } => "validation_error",
        }
    }
}
