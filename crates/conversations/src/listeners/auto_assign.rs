//! Auto-assignment trigger.

use std::sync::Arc;

use async_trait::async_trait;
use frontdesk_realtime::EventListener;

use crate::services::AssignmentService;
use crate::types::events::HelpdeskEvent;

/// Evaluates auto-assignment whenever a conversation starts. Failures are
/// contained by the dispatcher; a conversation that could not be assigned
/// simply stays pending.
pub struct AutoAssignListener {
    assignment: Arc<AssignmentService>,
}

impl AutoAssignListener {
    pub fn new(assignment: Arc<AssignmentService>) -> Self {
        Self { assignment }
    }
}

#[async_trait]
impl EventListener<HelpdeskEvent> for AutoAssignListener {
    async fn on_event(&self, event: HelpdeskEvent) -> anyhow::Result<()> {
        if let HelpdeskEvent::ConversationStarted { conversation, .. } = event {
            self.assignment.evaluate(conversation.id).await?;
        }
        Ok(())
    }
}
