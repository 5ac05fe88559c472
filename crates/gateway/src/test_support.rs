//! Shared fixtures for gateway tests: a fully wired memory-backed state
//! plus connect helpers that go through real admission.

use std::sync::Arc;

use tokio::sync::mpsc;

use frontdesk_conversations::{register_listeners, AssignmentService, ConversationService};
use frontdesk_realtime::{Client, Envelope, EventDispatcher, RealtimeHub};
use frontdesk_store::{
    CreateInboxRequest, CreateUserRequest, MemoryContactStore, MemoryConversationStore,
    MemoryInboxStore,
};

use crate::state::GatewayState;
use crate::websocket::connection::{admit, ConnectQuery};

pub(crate) struct TestBackend {
    pub state: GatewayState,
    pub inbox_id: i64,
    pub agent_id: i64,
}

pub(crate) async fn memory_state() -> TestBackend {
    let inboxes = Arc::new(MemoryInboxStore::new());
    let contacts = Arc::new(MemoryContactStore::new());
    let conversation_store = Arc::new(MemoryConversationStore::new(
        inboxes.clone(),
        contacts.clone(),
    ));
    let dispatcher = Arc::new(EventDispatcher::new());
    let hub = Arc::new(RealtimeHub::new());

    let conversations = Arc::new(ConversationService::new(
        conversation_store.clone(),
        inboxes.clone(),
        contacts.clone(),
        dispatcher.clone(),
    ));
    let assignment = Arc::new(AssignmentService::new(
        conversation_store,
        inboxes.clone(),
        dispatcher.clone(),
    ));
    register_listeners(&dispatcher, hub.clone(), assignment.clone()).await;

    let inbox = inboxes
        .insert_inbox(CreateInboxRequest {
            company_id: 1,
            name: "Support".to_string(),
            auto_assignment_enabled: false,
            max_auto_assignments: 5,
            auto_responder_message: None,
        })
        .await;
    let agent = inboxes
        .insert_agent(CreateUserRequest {
            company_id: 1,
            display_name: "Ana".to_string(),
            email: None,
        })
        .await;
    inboxes.grant_access(inbox.id, agent.id).await;

    let state = GatewayState::new(
        hub,
        dispatcher,
        conversations,
        assignment,
        contacts,
        inboxes.clone(),
        inboxes,
        64,
    );

    TestBackend {
        state,
        inbox_id: inbox.id,
        agent_id: agent.id,
    }
}

pub(crate) async fn connect_contact(
    backend: &TestBackend,
    contact_id: Option<i64>,
) -> (Arc<Client>, mpsc::Receiver<Envelope>) {
    let (tx, rx) = mpsc::channel(64);
    let query = ConnectQuery {
        kind: Some("contact".to_string()),
        user_id: None,
        contact_id,
        inbox_id: Some(backend.inbox_id),
    };
    let client = admit(&backend.state, &query, tx).await.expect("admission");
    (client, rx)
}

pub(crate) async fn connect_agent(backend: &TestBackend) -> (Arc<Client>, mpsc::Receiver<Envelope>) {
    let (tx, rx) = mpsc::channel(64);
    let query = ConnectQuery {
        kind: Some("agent".to_string()),
        user_id: Some(backend.agent_id),
        contact_id: None,
        inbox_id: None,
    };
    let client = admit(&backend.state, &query, tx).await.expect("admission");
    (client, rx)
}
