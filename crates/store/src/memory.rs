//! In-memory store implementations.
//!
//! Back the repository traits with plain maps so the realtime subsystem can
//! be exercised without a database. Used heavily by tests and by the seed
//! tooling.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::entities::{
    Contact, Conversation, ConversationMessage, ConversationStatus, ConversationWithRelations,
    CreateContactRequest, CreateConversationRequest, CreateInboxRequest, CreateMessageRequest,
    CreateUserRequest, Inbox, UpdateContactRequest, UpdateConversation, User,
};
use crate::repos::{ContactStore, ConversationStore, InboxStore, UserStore};
use crate::types::{StoreError, StoreResult};

#[derive(Default)]
struct ConversationTables {
    conversations: HashMap<i64, Conversation>,
    messages: HashMap<i64, Vec<ConversationMessage>>,
    next_conversation_id: i64,
    next_message_id: i64,
}

/// Conversation store over shared maps. Relations are resolved through the
/// inbox/contact stores handed in at construction so `get_with_relations`
/// behaves like the sqlite joins.
pub struct MemoryConversationStore {
    inner: Arc<RwLock<ConversationTables>>,
    inboxes: Arc<MemoryInboxStore>,
    contacts: Arc<MemoryContactStore>,
}

impl MemoryConversationStore {
    pub fn new(inboxes: Arc<MemoryInboxStore>, contacts: Arc<MemoryContactStore>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ConversationTables {
                next_conversation_id: 1,
                next_message_id: 1,
                ..ConversationTables::default()
            })),
            inboxes,
            contacts,
        }
    }

    /// Test helper: number of messages stored for a conversation.
    pub async fn message_count(&self, conversation_id: i64) -> usize {
        let tables = self.inner.read().await;
        tables
            .messages
            .get(&conversation_id)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create(&self, request: &CreateConversationRequest) -> StoreResult<Conversation> {
        let mut tables = self.inner.write().await;
        let id = tables.next_conversation_id;
        tables.next_conversation_id += 1;

        let now = chrono::Utc::now().to_rfc3339();
        let conversation = Conversation {
            id,
            public_id: cuid2::create_id(),
            company_id: request.company_id,
            inbox_id: request.inbox_id,
            contact_id: request.contact_id,
            status: ConversationStatus::Pending,
            assigned_to_id: None,
            last_message_content: None,
            last_message_at: None,
            created_at: now.clone(),
            updated_at: now,
        };

        tables.conversations.insert(id, conversation.clone());
        Ok(conversation)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Conversation>> {
        let tables = self.inner.read().await;
        Ok(tables.conversations.get(&id).cloned())
    }

    async fn get_with_relations(&self, id: i64) -> StoreResult<Option<ConversationWithRelations>> {
        let (conversation, messages) = {
            let tables = self.inner.read().await;
            let Some(conversation) = tables.conversations.get(&id).cloned() else {
                return Ok(None);
            };
            let messages = tables.messages.get(&id).cloned().unwrap_or_default();
            (conversation, messages)
        };

        let contact = self
            .contacts
            .get(conversation.contact_id)
            .await?
            .ok_or(StoreError::ContactNotFound {
                id: conversation.contact_id,
            })?;
        let inbox = InboxStore::get(&*self.inboxes, conversation.inbox_id)
            .await?
            .ok_or(StoreError::InboxNotFound {
                id: conversation.inbox_id,
            })?;

        Ok(Some(ConversationWithRelations {
            conversation,
            contact,
            inbox,
            messages,
        }))
    }

    async fn update(&self, id: i64, changes: &UpdateConversation) -> StoreResult<Conversation> {
        let mut tables = self.inner.write().await;
        let conversation = tables
            .conversations
            .get_mut(&id)
            .ok_or(StoreError::ConversationNotFound { id })?;

        if let Some(status) = changes.status {
            conversation.status = status;
        }
        if let Some(agent_id) = changes.assigned_to_id {
            conversation.assigned_to_id = Some(agent_id);
        }
        conversation.updated_at = chrono::Utc::now().to_rfc3339();

        Ok(conversation.clone())
    }

    async fn active_assigned_count(&self, agent_id: i64) -> StoreResult<i64> {
        let tables = self.inner.read().await;
        let count = tables
            .conversations
            .values()
            .filter(|c| c.assigned_to_id == Some(agent_id) && c.status.counts_toward_load())
            .count();
        Ok(count as i64)
    }

    async fn append_message(
        &self,
        request: &CreateMessageRequest,
    ) -> StoreResult<ConversationMessage> {
        let mut tables = self.inner.write().await;
        if !tables.conversations.contains_key(&request.conversation_id) {
            return Err(StoreError::ConversationNotFound {
                id: request.conversation_id,
            });
        }

        let id = tables.next_message_id;
        tables.next_message_id += 1;

        let now = chrono::Utc::now().to_rfc3339();
        let message = ConversationMessage {
            id,
            public_id: cuid2::create_id(),
            conversation_id: request.conversation_id,
            sender_type: request.sender_type,
            sender_id: request.sender_id,
            content: request.content.clone(),
            created_at: now.clone(),
        };

        tables
            .messages
            .entry(request.conversation_id)
            .or_default()
            .push(message.clone());

        let conversation = tables
            .conversations
            .get_mut(&request.conversation_id)
            .expect("checked above");
        conversation.last_message_content = Some(request.content.clone());
        conversation.last_message_at = Some(now.clone());
        conversation.updated_at = now;

        Ok(message)
    }
}

#[derive(Default)]
struct InboxTables {
    inboxes: HashMap<i64, Inbox>,
    users: HashMap<i64, User>,
    members: HashMap<i64, Vec<i64>>,
    next_inbox_id: i64,
    next_user_id: i64,
}

#[derive(Default)]
pub struct MemoryInboxStore {
    inner: RwLock<InboxTables>,
}

impl MemoryInboxStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(InboxTables {
                next_inbox_id: 1,
                next_user_id: 1,
                ..InboxTables::default()
            }),
        }
    }

    pub async fn insert_inbox(&self, request: CreateInboxRequest) -> Inbox {
        let mut tables = self.inner.write().await;
        let id = tables.next_inbox_id;
        tables.next_inbox_id += 1;

        let now = chrono::Utc::now().to_rfc3339();
        let inbox = Inbox {
            id,
            company_id: request.company_id,
            name: request.name,
            auto_assignment_enabled: request.auto_assignment_enabled,
            max_auto_assignments: request.max_auto_assignments,
            auto_responder_message: request.auto_responder_message,
            created_at: now.clone(),
            updated_at: now,
        };
        tables.inboxes.insert(id, inbox.clone());
        inbox
    }

    pub async fn insert_agent(&self, request: CreateUserRequest) -> User {
        let mut tables = self.inner.write().await;
        let id = tables.next_user_id;
        tables.next_user_id += 1;

        let user = User {
            id,
            public_id: cuid2::create_id(),
            company_id: request.company_id,
            display_name: request.display_name,
            email: request.email,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        tables.users.insert(id, user.clone());
        user
    }

    pub async fn grant_access(&self, inbox_id: i64, user_id: i64) {
        let mut tables = self.inner.write().await;
        let members = tables.members.entry(inbox_id).or_default();
        if !members.contains(&user_id) {
            members.push(user_id);
        }
    }
}

#[async_trait]
impl InboxStore for MemoryInboxStore {
    async fn get(&self, id: i64) -> StoreResult<Option<Inbox>> {
        let tables = self.inner.read().await;
        Ok(tables.inboxes.get(&id).cloned())
    }

    async fn agents_with_access(&self, inbox_id: i64) -> StoreResult<Vec<User>> {
        let tables = self.inner.read().await;
        let ids = tables.members.get(&inbox_id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| tables.users.get(&id).cloned())
            .collect())
    }

    async fn inbox_ids_for_agent(&self, user_id: i64) -> StoreResult<Vec<i64>> {
        let tables = self.inner.read().await;
        let mut ids: Vec<i64> = tables
            .members
            .iter()
            .filter(|(_, members)| members.contains(&user_id))
            .map(|(inbox_id, _)| *inbox_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[async_trait]
impl UserStore for MemoryInboxStore {
    async fn get(&self, id: i64) -> StoreResult<Option<User>> {
        let tables = self.inner.read().await;
        Ok(tables.users.get(&id).cloned())
    }
}

#[derive(Default)]
struct ContactTables {
    contacts: HashMap<i64, Contact>,
    next_id: i64,
}

#[derive(Default)]
pub struct MemoryContactStore {
    inner: RwLock<ContactTables>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ContactTables {
                next_id: 1,
                ..ContactTables::default()
            }),
        }
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn create(&self, request: &CreateContactRequest) -> StoreResult<Contact> {
        let mut tables = self.inner.write().await;
        let id = tables.next_id;
        tables.next_id += 1;

        let now = chrono::Utc::now().to_rfc3339();
        let contact = Contact {
            id,
            public_id: cuid2::create_id(),
            company_id: request.company_id,
            name: request.name.clone(),
            email: request.email.clone(),
            created_at: now.clone(),
            updated_at: now,
        };
        tables.contacts.insert(id, contact.clone());
        Ok(contact)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Contact>> {
        let tables = self.inner.read().await;
        Ok(tables.contacts.get(&id).cloned())
    }

    async fn update(&self, id: i64, request: &UpdateContactRequest) -> StoreResult<Contact> {
        let mut tables = self.inner.write().await;
        let contact = tables
            .contacts
            .get_mut(&id)
            .ok_or(StoreError::ContactNotFound { id })?;

        if let Some(ref name) = request.name {
            contact.name = Some(name.clone());
        }
        if let Some(ref email) = request.email {
            contact.email = Some(email.clone());
        }
        contact.updated_at = chrono::Utc::now().to_rfc3339();

        Ok(contact.clone())
    }
}
