//! Entity definitions shared by every store implementation.

pub mod contact;
pub mod conversation;
pub mod inbox;
pub mod message;
pub mod user;

pub use contact::{Contact, CreateContactRequest, UpdateContactRequest};
pub use conversation::{
    Conversation, ConversationStatus, ConversationWithRelations, CreateConversationRequest,
    UpdateConversation,
};
pub use inbox::{CreateInboxRequest, Inbox};
pub use message::{ConversationMessage, CreateMessageRequest, SenderType};
pub use user::{CreateUserRequest, User};
