//! Shared gateway state.
//!
//! Everything the websocket handlers need, constructed once at process
//! start and handed in explicitly.

use std::sync::Arc;

use frontdesk_conversations::{AssignmentService, ConversationService, HelpdeskEvent};
use frontdesk_realtime::{EventDispatcher, RealtimeHub};
use frontdesk_store::{ContactStore, InboxStore, UserStore};

#[derive(Clone)]
pub struct GatewayState {
    pub hub: Arc<RealtimeHub>,
    pub dispatcher: Arc<EventDispatcher<HelpdeskEvent>>,
    pub conversations: Arc<ConversationService>,
    pub assignment: Arc<AssignmentService>,
    pub contacts: Arc<dyn ContactStore>,
    pub inboxes: Arc<dyn InboxStore>,
    pub users: Arc<dyn UserStore>,
    /// Capacity of each client's outbound frame queue.
    pub send_buffer: usize,
}

impl GatewayState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        hub: Arc<RealtimeHub>,
        dispatcher: Arc<EventDispatcher<HelpdeskEvent>>,
        conversations: Arc<ConversationService>,
        assignment: Arc<AssignmentService>,
        contacts: Arc<dyn ContactStore>,
        inboxes: Arc<dyn InboxStore>,
        users: Arc<dyn UserStore>,
        send_buffer: usize,
    ) -> Self {
        Self {
            hub,
            dispatcher,
            conversations,
            assignment,
            contacts,
            inboxes,
            users,
            send_buffer,
        }
    }
}
