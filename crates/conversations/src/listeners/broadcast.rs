//! Topic fan-out for domain events.

use std::sync::Arc;

use async_trait::async_trait;
use frontdesk_realtime::wire::topic;
use frontdesk_realtime::{Envelope, EventListener, RealtimeHub};
use serde_json::json;

use crate::types::events::HelpdeskEvent;

/// Maps each domain event to the topics that should hear about it and
/// publishes one envelope per topic. The mapping lives here and nowhere
/// else; business services stay unaware of topics.
pub struct BroadcastListener {
    hub: Arc<RealtimeHub>,
}

impl BroadcastListener {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }

    /// Topics affected by an event, in publish order.
    fn topics_for(event: &HelpdeskEvent) -> Vec<String> {
        match event {
            HelpdeskEvent::ConversationStarted { conversation, .. } => vec![
                topic::conversation(conversation.id),
                topic::company(conversation.company_id),
            ],
            HelpdeskEvent::MessageCreated { message, .. } => {
                vec![topic::conversation(message.conversation_id)]
            }
            HelpdeskEvent::ConversationAssigned {
                conversation,
                agent_id,
            } => vec![
                topic::conversation(conversation.id),
                topic::user(*agent_id),
                topic::company(conversation.company_id),
            ],
            HelpdeskEvent::ConversationClosed { conversation } => vec![
                topic::conversation(conversation.id),
                topic::company(conversation.company_id),
            ],
            HelpdeskEvent::TypingStarted {
                conversation_id, ..
            }
            | HelpdeskEvent::TypingStopped {
                conversation_id, ..
            } => vec![topic::conversation(*conversation_id)],
            HelpdeskEvent::ContactCreated { contact }
            | HelpdeskEvent::ContactUpdated { contact } => {
                vec![topic::company(contact.company_id)]
            }
            HelpdeskEvent::ContactDeleted { company_id, .. }
            | HelpdeskEvent::InboxDeleted { company_id, .. }
            | HelpdeskEvent::UserLoggedIn { company_id, .. } => {
                vec![topic::company(*company_id)]
            }
            HelpdeskEvent::InboxCreated { inbox } | HelpdeskEvent::InboxUpdated { inbox } => {
                vec![topic::company(inbox.company_id)]
            }
        }
    }

    fn payload_for(event: &HelpdeskEvent) -> serde_json::Value {
        match event {
            HelpdeskEvent::ConversationStarted {
                conversation,
                contact,
            } => json!({ "conversation": conversation, "contact": contact }),
            HelpdeskEvent::MessageCreated { message, .. } => json!({ "message": message }),
            HelpdeskEvent::ConversationAssigned {
                conversation,
                agent_id,
            } => json!({ "conversation": conversation, "agent_id": agent_id }),
            HelpdeskEvent::ConversationClosed { conversation } => {
                json!({ "conversation": conversation })
            }
            HelpdeskEvent::TypingStarted {
                conversation_id,
                actor,
                ..
            }
            | HelpdeskEvent::TypingStopped {
                conversation_id,
                actor,
                ..
            } => json!({ "conversation_id": conversation_id, "actor": actor }),
            HelpdeskEvent::ContactCreated { contact }
            | HelpdeskEvent::ContactUpdated { contact } => json!({ "contact": contact }),
            HelpdeskEvent::ContactDeleted { contact_id, .. } => {
                json!({ "contact_id": contact_id })
            }
            HelpdeskEvent::InboxCreated { inbox } | HelpdeskEvent::InboxUpdated { inbox } => {
                json!({ "inbox": inbox })
            }
            HelpdeskEvent::InboxDeleted { inbox_id, .. } => json!({ "inbox_id": inbox_id }),
            HelpdeskEvent::UserLoggedIn { user_id, .. } => json!({ "user_id": user_id }),
        }
    }
}

#[async_trait]
impl EventListener<HelpdeskEvent> for BroadcastListener {
    async fn on_event(&self, event: HelpdeskEvent) -> anyhow::Result<()> {
        let name = event.event_type_name();
        let payload = Self::payload_for(&event);

        for topic in Self::topics_for(&event) {
            self.hub
                .publish(&topic, Envelope::new(name, payload.clone()))
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_store::{Contact, Conversation, ConversationStatus};

    fn sample_conversation() -> Conversation {
        Conversation {
            id: 12,
            public_id: "cnv12".to_string(),
            company_id: 3,
            inbox_id: 1,
            contact_id: 5,
            status: ConversationStatus::Pending,
            assigned_to_id: None,
            last_message_content: None,
            last_message_at: None,
            created_at: "2024-05-01T00:00:00Z".to_string(),
            updated_at: "2024-05-01T00:00:00Z".to_string(),
        }
    }

    fn sample_contact() -> Contact {
        Contact {
            id: 5,
            public_id: "ct5".to_string(),
            company_id: 3,
            name: None,
            email: None,
            created_at: "2024-05-01T00:00:00Z".to_string(),
            updated_at: "2024-05-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn started_event_targets_conversation_and_company() {
        let event = HelpdeskEvent::ConversationStarted {
            conversation: sample_conversation(),
            contact: sample_contact(),
        };
        assert_eq!(
            BroadcastListener::topics_for(&event),
            vec!["conversation:12".to_string(), "company:3".to_string()]
        );
    }

    #[test]
    fn assigned_event_also_targets_the_agent() {
        let event = HelpdeskEvent::ConversationAssigned {
            conversation: sample_conversation(),
            agent_id: 77,
        };
        let topics = BroadcastListener::topics_for(&event);
        assert!(topics.contains(&"user:77".to_string()));
        assert!(topics.contains(&"conversation:12".to_string()));
        assert!(topics.contains(&"company:3".to_string()));
    }

    #[test]
    fn typing_stays_inside_the_conversation() {
        let event = HelpdeskEvent::TypingStarted {
            company_id: 3,
            conversation_id: 12,
            actor: crate::types::events::Participant::Contact { contact_id: 5 },
        };
        assert_eq!(
            BroadcastListener::topics_for(&event),
            vec!["conversation:12".to_string()]
        );
    }
}
