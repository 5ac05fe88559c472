//! Conversation lifecycle service.
//!
//! Owns the pending → active → closed state machine. Every state change and
//! every appended message is announced through the event dispatcher; this
//! service never publishes to topics itself.

use std::sync::Arc;

use frontdesk_realtime::EventDispatcher;
use frontdesk_store::{
    ContactStore, Conversation, ConversationMessage, ConversationStatus, ConversationStore,
    ConversationWithRelations, CreateConversationRequest, CreateMessageRequest, InboxStore,
    SenderType, UpdateConversation,
};
use tracing::{debug, info};

use crate::types::errors::{ConversationError, ConversationResult};
use crate::types::events::{HelpdeskEvent, Participant};

const CLOSED_NOTICE: &str = "Conversation was closed";

pub struct ConversationService {
    conversations: Arc<dyn ConversationStore>,
    inboxes: Arc<dyn InboxStore>,
    contacts: Arc<dyn ContactStore>,
    dispatcher: Arc<EventDispatcher<HelpdeskEvent>>,
}

impl ConversationService {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        inboxes: Arc<dyn InboxStore>,
        contacts: Arc<dyn ContactStore>,
        dispatcher: Arc<EventDispatcher<HelpdeskEvent>>,
    ) -> Self {
        Self {
            conversations,
            inboxes,
            contacts,
            dispatcher,
        }
    }

    /// Open a new conversation for a contact against an inbox. The
    /// conversation starts `pending`; the contact's opening message and the
    /// inbox auto-responder (when configured) are appended before the
    /// started event goes out. Assignment is not decided here.
    pub async fn start_conversation(
        &self,
        contact_id: i64,
        inbox_id: i64,
        opening_message: Option<String>,
    ) -> ConversationResult<Conversation> {
        let contact = self
            .contacts
            .get(contact_id)
            .await?
            .ok_or(ConversationError::ContactNotFound { id: contact_id })?;
        let inbox = self
            .inboxes
            .get(inbox_id)
            .await?
            .ok_or(ConversationError::InboxNotFound { id: inbox_id })?;

        if contact.company_id != inbox.company_id {
            return Err(ConversationError::validation(
                "contact and inbox belong to different companies",
            ));
        }

        let conversation = self
            .conversations
            .create(&CreateConversationRequest {
                company_id: inbox.company_id,
                inbox_id,
                contact_id,
            })
            .await?;

        info!(
            conversation_id = conversation.id,
            inbox_id, contact_id, "conversation started"
        );

        if let Some(content) = opening_message.as_deref().map(str::trim) {
            if !content.is_empty() {
                let message = self
                    .conversations
                    .append_message(&CreateMessageRequest {
                        conversation_id: conversation.id,
                        sender_type: SenderType::Contact,
                        sender_id: Some(contact_id),
                        content: content.to_string(),
                    })
                    .await?;
                self.dispatcher
                    .dispatch(HelpdeskEvent::MessageCreated {
                        company_id: conversation.company_id,
                        message,
                    })
                    .await;
            }
        }

        // The auto-responder fires on start regardless of what assignment
        // later decides.
        if let Some(ref auto_response) = inbox.auto_responder_message {
            let message = self
                .conversations
                .append_message(&CreateMessageRequest {
                    conversation_id: conversation.id,
                    sender_type: SenderType::Bot,
                    sender_id: None,
                    content: auto_response.clone(),
                })
                .await?;
            self.dispatcher
                .dispatch(HelpdeskEvent::MessageCreated {
                    company_id: conversation.company_id,
                    message,
                })
                .await;
        }

        let conversation = self
            .conversations
            .get(conversation.id)
            .await?
            .ok_or(ConversationError::ConversationNotFound {
                id: conversation.id,
            })?;

        self.dispatcher
            .dispatch(HelpdeskEvent::ConversationStarted {
                conversation: conversation.clone(),
                contact,
            })
            .await;

        Ok(conversation)
    }

    /// Append a message. Closed and resolved conversations take nothing;
    /// the rejection leaves the store untouched.
    pub async fn send_message(
        &self,
        conversation_id: i64,
        sender_type: SenderType,
        sender_id: Option<i64>,
        content: String,
    ) -> ConversationResult<ConversationMessage> {
        let conversation = self.require(conversation_id).await?;

        if !conversation.status.accepts_messages() {
            return Err(ConversationError::ConversationClosed);
        }

        let content = content.trim().to_string();
        if content.is_empty() {
            return Err(ConversationError::validation("message content is empty"));
        }

        let message = self
            .conversations
            .append_message(&CreateMessageRequest {
                conversation_id,
                sender_type,
                sender_id,
                content,
            })
            .await?;

        self.dispatcher
            .dispatch(HelpdeskEvent::MessageCreated {
                company_id: conversation.company_id,
                message: message.clone(),
            })
            .await;

        Ok(message)
    }

    /// Explicit assignment. Promotes a pending conversation to active; any
    /// other status is left as it is.
    pub async fn assign(
        &self,
        conversation_id: i64,
        agent_id: i64,
    ) -> ConversationResult<Conversation> {
        let conversation = self.require(conversation_id).await?;

        if conversation.assigned_to_id == Some(agent_id) {
            return Err(ConversationError::AlreadyAssigned);
        }

        let changes = UpdateConversation {
            status: (conversation.status == ConversationStatus::Pending)
                .then_some(ConversationStatus::Active),
            assigned_to_id: Some(agent_id),
        };
        let updated = self.conversations.update(conversation_id, &changes).await?;

        info!(conversation_id, agent_id, "conversation assigned");

        self.dispatcher
            .dispatch(HelpdeskEvent::ConversationAssigned {
                conversation: updated.clone(),
                agent_id,
            })
            .await;

        Ok(updated)
    }

    /// Close the conversation. A system message announcing the closure is
    /// appended first, then the status flips; afterwards `send_message`
    /// rejects.
    pub async fn close(&self, conversation_id: i64) -> ConversationResult<Conversation> {
        let conversation = self.require(conversation_id).await?;

        if conversation.status.is_terminal() {
            return Err(ConversationError::ConversationClosed);
        }

        let message = self
            .conversations
            .append_message(&CreateMessageRequest {
                conversation_id,
                sender_type: SenderType::System,
                sender_id: None,
                content: CLOSED_NOTICE.to_string(),
            })
            .await?;

        let updated = self
            .conversations
            .update(
                conversation_id,
                &UpdateConversation {
                    status: Some(ConversationStatus::Closed),
                    assigned_to_id: None,
                },
            )
            .await?;

        info!(conversation_id, "conversation closed");

        self.dispatcher
            .dispatch(HelpdeskEvent::MessageCreated {
                company_id: updated.company_id,
                message,
            })
            .await;
        self.dispatcher
            .dispatch(HelpdeskEvent::ConversationClosed {
                conversation: updated.clone(),
            })
            .await;

        Ok(updated)
    }

    pub async fn get_with_relations(
        &self,
        conversation_id: i64,
    ) -> ConversationResult<ConversationWithRelations> {
        self.conversations
            .get_with_relations(conversation_id)
            .await?
            .ok_or(ConversationError::ConversationNotFound {
                id: conversation_id,
            })
    }

    pub async fn get(&self, conversation_id: i64) -> ConversationResult<Conversation> {
        self.require(conversation_id).await
    }

    /// Typing indicators are transient: dispatched, never persisted.
    pub async fn typing(
        &self,
        conversation_id: i64,
        actor: Participant,
        started: bool,
    ) -> ConversationResult<()> {
        let conversation = self.require(conversation_id).await?;

        let event = if started {
            HelpdeskEvent::TypingStarted {
                company_id: conversation.company_id,
                conversation_id,
                actor,
            }
        } else {
            HelpdeskEvent::TypingStopped {
                company_id: conversation.company_id,
                conversation_id,
                actor,
            }
        };

        debug!(conversation_id, started, "typing indicator");
        self.dispatcher.dispatch(event).await;
        Ok(())
    }

    async fn require(&self, conversation_id: i64) -> ConversationResult<Conversation> {
        self.conversations
            .get(conversation_id)
            .await?
            .ok_or(ConversationError::ConversationNotFound {
                id: conversation_id,
            })
    }
}
