//! Domain event types for the helpdesk.
//!
//! These are dispatched whenever something domain-relevant happens and exist
//! only for the duration of dispatch. Listeners decide who gets told.

use frontdesk_realtime::DomainEvent;
use frontdesk_store::{Contact, Conversation, ConversationMessage, Inbox};
use serde::{Deserialize, Serialize};

/// Who performed an action inside a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Participant {
    Agent { user_id: i64 },
    Contact { contact_id: i64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum HelpdeskEvent {
    /// A contact opened a new conversation against an inbox.
    ConversationStarted {
        conversation: Conversation,
        contact: Contact,
    },

    /// A message was persisted into a conversation.
    MessageCreated {
        company_id: i64,
        message: ConversationMessage,
    },

    /// An agent took (or was given) a conversation.
    ConversationAssigned {
        conversation: Conversation,
        agent_id: i64,
    },

    /// The conversation was closed; no further messages are accepted.
    ConversationClosed { conversation: Conversation },

    TypingStarted {
        company_id: i64,
        conversation_id: i64,
        actor: Participant,
    },

    TypingStopped {
        company_id: i64,
        conversation_id: i64,
        actor: Participant,
    },

    ContactCreated { contact: Contact },
    ContactUpdated { contact: Contact },
    ContactDeleted { company_id: i64, contact_id: i64 },

    InboxCreated { inbox: Inbox },
    InboxUpdated { inbox: Inbox },
    InboxDeleted { company_id: i64, inbox_id: i64 },

    /// An agent connected to the realtime endpoint.
    UserLoggedIn { company_id: i64, user_id: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ConversationStarted,
    MessageCreated,
    ConversationAssigned,
    ConversationClosed,
    TypingStarted,
    TypingStopped,
    ContactCreated,
    ContactUpdated,
    ContactDeleted,
    InboxCreated,
    InboxUpdated,
    InboxDeleted,
    UserLoggedIn,
}

impl EventKind {
    /// Every kind, for listeners that want the whole stream.
    pub const ALL: &'static [EventKind] = &[
        EventKind::ConversationStarted,
        EventKind::MessageCreated,
        EventKind::ConversationAssigned,
        EventKind::ConversationClosed,
        EventKind::TypingStarted,
        EventKind::TypingStopped,
        EventKind::ContactCreated,
        EventKind::ContactUpdated,
        EventKind::ContactDeleted,
        EventKind::InboxCreated,
        EventKind::InboxUpdated,
        EventKind::InboxDeleted,
        EventKind::UserLoggedIn,
    ];
}

impl DomainEvent for HelpdeskEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            HelpdeskEvent::ConversationStarted { .. } => EventKind::ConversationStarted,
            HelpdeskEvent::MessageCreated { .. } => EventKind::MessageCreated,
            HelpdeskEvent::ConversationAssigned { .. } => EventKind::ConversationAssigned,
            HelpdeskEvent::ConversationClosed { .. } => EventKind::ConversationClosed,
            HelpdeskEvent::TypingStarted { .. } => EventKind::TypingStarted,
            HelpdeskEvent::TypingStopped { .. } => EventKind::TypingStopped,
            HelpdeskEvent::ContactCreated { .. } => EventKind::ContactCreated,
            HelpdeskEvent::ContactUpdated { .. } => EventKind::ContactUpdated,
            HelpdeskEvent::ContactDeleted { .. } => EventKind::ContactDeleted,
            HelpdeskEvent::InboxCreated { .. } => EventKind::InboxCreated,
            HelpdeskEvent::InboxUpdated { .. } => EventKind::InboxUpdated,
            HelpdeskEvent::InboxDeleted { .. } => EventKind::InboxDeleted,
            HelpdeskEvent::UserLoggedIn { .. } => EventKind::UserLoggedIn,
        }
    }
}

impl HelpdeskEvent {
    /// Wire event name for frames produced from this event.
    pub fn event_type_name(&self) -> &'static str {
        use frontdesk_realtime::wire::events;

        match self {
            HelpdeskEvent::ConversationStarted { .. } => events::CONVERSATION_STARTED,
            HelpdeskEvent::MessageCreated { .. } => events::MESSAGE_CREATED,
            HelpdeskEvent::ConversationAssigned { .. } => events::CONVERSATION_ASSIGNED,
            HelpdeskEvent::ConversationClosed { .. } => events::CONVERSATION_CLOSED,
            HelpdeskEvent::TypingStarted { .. } => events::CONVERSATION_TYPING,
            HelpdeskEvent::TypingStopped { .. } => events::CONVERSATION_TYPING_STOP,
            HelpdeskEvent::ContactCreated { .. } => events::CONTACT_CREATED,
            HelpdeskEvent::ContactUpdated { .. } => events::CONTACT_UPDATED,
            HelpdeskEvent::ContactDeleted { .. } => events::CONTACT_DELETED,
            HelpdeskEvent::InboxCreated { .. } => events::INBOX_CREATED,
            HelpdeskEvent::InboxUpdated { .. } => events::INBOX_UPDATED,
            HelpdeskEvent::InboxDeleted { .. } => events::INBOX_DELETED,
            HelpdeskEvent::UserLoggedIn { .. } => events::USER_LOGGED_IN,
        }
    }

    /// The conversation this event belongs to, when there is one.
    pub fn conversation_id(&self) -> Option<i64> {
        match self {
            HelpdeskEvent::ConversationStarted { conversation, .. }
            | HelpdeskEvent::ConversationAssigned { conversation, .. }
            | HelpdeskEvent::ConversationClosed { conversation } => Some(conversation.id),
            HelpdeskEvent::MessageCreated { message, .. } => Some(message.conversation_id),
            HelpdeskEvent::TypingStarted {
                conversation_id, ..
            }
            | HelpdeskEvent::TypingStopped {
                conversation_id, ..
            } => Some(*conversation_id),
            _ => None,
        }
    }

    pub fn company_id(&self) -> i64 {
        match self {
            HelpdeskEvent::ConversationStarted { conversation, .. }
            | HelpdeskEvent::ConversationAssigned { conversation, .. }
            | HelpdeskEvent::ConversationClosed { conversation } => conversation.company_id,
            HelpdeskEvent::MessageCreated { company_id, .. }
            | HelpdeskEvent::TypingStarted { company_id, .. }
            | HelpdeskEvent::TypingStopped { company_id, .. }
            | HelpdeskEvent::ContactDeleted { company_id, .. }
            | HelpdeskEvent::InboxDeleted { company_id, .. }
            | HelpdeskEvent::UserLoggedIn { company_id, .. } => *company_id,
            HelpdeskEvent::ContactCreated { contact }
            | HelpdeskEvent::ContactUpdated { contact } => contact.company_id,
            HelpdeskEvent::InboxCreated { inbox } | HelpdeskEvent::InboxUpdated { inbox } => {
                inbox.company_id
            }
        }
    }
}
