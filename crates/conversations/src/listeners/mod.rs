//! Event listeners reacting to domain events.
//!
//! Listeners are the only place that decides which topics learn about which
//! events. They are registered once at startup and never unsubscribed.

pub mod auto_assign;
pub mod broadcast;

pub use auto_assign::AutoAssignListener;
pub use broadcast::BroadcastListener;

use std::sync::Arc;

use frontdesk_realtime::{EventDispatcher, RealtimeHub};

use crate::services::AssignmentService;
use crate::types::events::{EventKind, HelpdeskEvent};

/// Wire the standard listener set: topic fan-out for every event kind,
/// auto-assignment on conversation start.
pub async fn register_listeners(
    dispatcher: &EventDispatcher<HelpdeskEvent>,
    hub: Arc<RealtimeHub>,
    assignment: Arc<AssignmentService>,
) {
    dispatcher
        .subscribe_many(EventKind::ALL, Arc::new(BroadcastListener::new(hub)))
        .await;
    dispatcher
        .subscribe(
            EventKind::ConversationStarted,
            Arc::new(AutoAssignListener::new(assignment)),
        )
        .await;
}
