//! Connected client representation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::warn;

use crate::error::{RealtimeError, RealtimeResult};
use crate::wire::Envelope;

/// Per-connection identifier. Two sockets for the same user are two
/// distinct clients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(String);

impl ClientId {
    pub(crate) fn generate() -> Self {
        Self(cuid2::create_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    Agent,
    Contact,
}

impl ClientRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientRole::Agent => "agent",
            ClientRole::Contact => "contact",
        }
    }
}

/// Identity handed to `ConnectionRegistry::register`. The gateway resolves
/// these from the upgrade request before admission.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub role: ClientRole,
    pub company_id: i64,
    pub user_id: Option<i64>,
    pub contact_id: Option<i64>,
    /// For agents: the inboxes they may work. For contacts: the single
    /// inbox they connected against.
    pub inbox_ids: Vec<i64>,
}

/// A connected participant. Owned by the registry for the lifetime of its
/// connection; dropped on disconnect or send failure.
pub struct Client {
    id: ClientId,
    role: ClientRole,
    company_id: i64,
    user_id: Option<i64>,
    contact_id: Option<i64>,
    inbox_ids: RwLock<HashSet<i64>>,
    sender: mpsc::Sender<Envelope>,
}

impl Client {
    pub(crate) fn new(params: ConnectParams, sender: mpsc::Sender<Envelope>) -> Self {
        Self {
            id: ClientId::generate(),
            role: params.role,
            company_id: params.company_id,
            user_id: params.user_id,
            contact_id: params.contact_id,
            inbox_ids: RwLock::new(params.inbox_ids.into_iter().collect()),
            sender,
        }
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn role(&self) -> ClientRole {
        self.role
    }

    pub fn is_agent(&self) -> bool {
        self.role == ClientRole::Agent
    }

    pub fn company_id(&self) -> i64 {
        self.company_id
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user_id
    }

    pub fn contact_id(&self) -> Option<i64> {
        self.contact_id
    }

    pub async fn can_access_inbox(&self, inbox_id: i64) -> bool {
        self.inbox_ids.read().await.contains(&inbox_id)
    }

    pub async fn inbox_ids(&self) -> HashSet<i64> {
        self.inbox_ids.read().await.clone()
    }

    pub(crate) async fn replace_inbox_scope(&self, inbox_ids: Vec<i64>) {
        *self.inbox_ids.write().await = inbox_ids.into_iter().collect();
    }

    /// Queue a frame for this client. The per-client writer task drains the
    /// queue in order, which is what keeps one client's frames from
    /// interleaving. A closed channel means the connection is gone and the
    /// caller must remove the client; a full queue drops the frame.
    pub fn send(&self, envelope: Envelope) -> RealtimeResult<()> {
        match self.sender.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(
                    client_id = %self.id,
                    event = %dropped.event,
                    "outbound queue full, dropping frame"
                );
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(RealtimeError::ClientGone),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("company_id", &self.company_id)
            .field("user_id", &self.user_id)
            .field("contact_id", &self.contact_id)
            .finish_non_exhaustive()
    }
}
