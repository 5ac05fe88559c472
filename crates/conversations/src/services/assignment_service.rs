//! Automatic agent assignment.
//!
//! Runs right after a conversation enters `pending` on an inbox with
//! auto-assignment enabled. Picks uniformly at random among the agents
//! still under the inbox's concurrent-assignment cap. If nobody is
//! eligible the conversation stays pending and unassigned; there is no
//! queue and no retry.

use std::sync::Arc;

use frontdesk_realtime::EventDispatcher;
use frontdesk_store::{
    Conversation, ConversationStatus, ConversationStore, InboxStore, UpdateConversation,
};
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::types::errors::{ConversationError, ConversationResult};
use crate::types::events::HelpdeskEvent;

pub struct AssignmentService {
    conversations: Arc<dyn ConversationStore>,
    inboxes: Arc<dyn InboxStore>,
    dispatcher: Arc<EventDispatcher<HelpdeskEvent>>,
}

impl AssignmentService {
    pub fn new(
        conversations: Arc<dyn ConversationStore>,
        inboxes: Arc<dyn InboxStore>,
        dispatcher: Arc<EventDispatcher<HelpdeskEvent>>,
    ) -> Self {
        Self {
            conversations,
            inboxes,
            dispatcher,
        }
    }

    /// Evaluate auto-assignment for one conversation. Returns the updated
    /// conversation when an agent was picked, `None` when the conversation
    /// was not eligible or no agent had capacity. Never touches a
    /// conversation that already has an assignee.
    pub async fn evaluate(&self, conversation_id: i64) -> ConversationResult<Option<Conversation>> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or(ConversationError::ConversationNotFound {
                id: conversation_id,
            })?;

        if conversation.status != ConversationStatus::Pending
            || conversation.assigned_to_id.is_some()
        {
            return Ok(None);
        }

        let inbox = self
            .inboxes
            .get(conversation.inbox_id)
            .await?
            .ok_or(ConversationError::InboxNotFound {
                id: conversation.inbox_id,
            })?;

        if !inbox.auto_assignment_enabled {
            return Ok(None);
        }

        let agents = self.inboxes.agents_with_access(inbox.id).await?;
        let mut eligible = Vec::new();
        for agent in agents {
            let load = self.conversations.active_assigned_count(agent.id).await?;
            if load < inbox.max_auto_assignments {
                eligible.push(agent.id);
            }
        }

        let chosen = {
            let mut rng = rand::thread_rng();
            eligible.choose(&mut rng).copied()
        };

        let Some(agent_id) = chosen else {
            debug!(
                conversation_id,
                inbox_id = inbox.id,
                "no agent with capacity, conversation stays pending"
            );
            return Ok(None);
        };

        let updated = self
            .conversations
            .update(
                conversation_id,
                &UpdateConversation {
                    status: Some(ConversationStatus::Active),
                    assigned_to_id: Some(agent_id),
                },
            )
            .await?;

        info!(conversation_id, agent_id, "conversation auto-assigned");

        self.dispatcher
            .dispatch(HelpdeskEvent::ConversationAssigned {
                conversation: updated.clone(),
                agent_id,
            })
            .await;

        Ok(Some(updated))
    }
}
