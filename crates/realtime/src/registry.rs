//! Connection registry: who is connected right now.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info};

use crate::client::{Client, ClientId, ClientRole, ConnectParams};
use crate::error::{RealtimeError, RealtimeResult};
use crate::wire::Envelope;

#[derive(Default)]
struct RegistryInner {
    clients: HashMap<ClientId, Arc<Client>>,
    agents: HashSet<ClientId>,
    contacts: HashSet<ClientId>,
}

/// Tracks every connected client, partitioned by role.
///
/// All reads and writes go through the one `RwLock` below. Do not add a
/// side channel for mutations: a broadcast iterating these maps while a
/// registration mutates them outside the lock is exactly the race this
/// layout exists to rule out.
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    /// Admit a connection. Validates the role's identity requirements; on
    /// failure no client is created and the caller must close the socket.
    pub async fn register(
        &self,
        params: ConnectParams,
        sender: mpsc::Sender<Envelope>,
    ) -> RealtimeResult<Arc<Client>> {
        match params.role {
            ClientRole::Agent => {
                if params.user_id.is_none() {
                    return Err(RealtimeError::admission_refused(
                        "agent connections require a user_id",
                    ));
                }
            }
            ClientRole::Contact => {
                if params.contact_id.is_none() {
                    return Err(RealtimeError::admission_refused(
                        "contact connections require a contact_id",
                    ));
                }
                if params.inbox_ids.is_empty() {
                    return Err(RealtimeError::admission_refused(
                        "contact connections require an inbox context",
                    ));
                }
            }
        }

        let client = Arc::new(Client::new(params, sender));

        let mut inner = self.inner.write().await;
        inner.clients.insert(client.id().clone(), client.clone());
        match client.role() {
            ClientRole::Agent => inner.agents.insert(client.id().clone()),
            ClientRole::Contact => inner.contacts.insert(client.id().clone()),
        };

        info!(
            client_id = %client.id(),
            role = client.role().as_str(),
            company_id = client.company_id(),
            "client registered"
        );
        Ok(client)
    }

    /// Idempotent removal; both the unified map and the role partition are
    /// updated under the same write lock.
    pub async fn remove(&self, client_id: &ClientId) -> Option<Arc<Client>> {
        let mut inner = self.inner.write().await;
        let removed = inner.clients.remove(client_id);
        inner.agents.remove(client_id);
        inner.contacts.remove(client_id);

        if let Some(ref client) = removed {
            debug!(client_id = %client.id(), "client removed");
        }
        removed
    }

    /// Replace an agent's inbox access scope without a reconnect.
    pub async fn update_access_scope(
        &self,
        client_id: &ClientId,
        inbox_ids: Vec<i64>,
    ) -> RealtimeResult<()> {
        let client = {
            let inner = self.inner.read().await;
            inner
                .clients
                .get(client_id)
                .cloned()
                .ok_or_else(|| RealtimeError::unknown_client(client_id.as_str()))?
        };

        client.replace_inbox_scope(inbox_ids).await;
        Ok(())
    }

    pub async fn get(&self, client_id: &ClientId) -> Option<Arc<Client>> {
        self.inner.read().await.clients.get(client_id).cloned()
    }

    pub async fn agents(&self) -> Vec<Arc<Client>> {
        let inner = self.inner.read().await;
        inner
            .agents
            .iter()
            .filter_map(|id| inner.clients.get(id).cloned())
            .collect()
    }

    pub async fn contacts(&self) -> Vec<Arc<Client>> {
        let inner = self.inner.read().await;
        inner
            .contacts
            .iter()
            .filter_map(|id| inner.clients.get(id).cloned())
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.clients.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.clients.is_empty()
    }

    /// Agents of a company whose user_id is currently connected. Used by
    /// presence checks.
    pub async fn agent_online(&self, user_id: i64) -> bool {
        let inner = self.inner.read().await;
        inner
            .agents
            .iter()
            .filter_map(|id| inner.clients.get(id))
            .any(|client| client.user_id() == Some(user_id))
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent_params(user_id: i64) -> ConnectParams {
        ConnectParams {
            role: ClientRole::Agent,
            company_id: 1,
            user_id: Some(user_id),
            contact_id: None,
            inbox_ids: vec![10, 11],
        }
    }

    fn contact_params(contact_id: i64) -> ConnectParams {
        ConnectParams {
            role: ClientRole::Contact,
            company_id: 1,
            user_id: None,
            contact_id: Some(contact_id),
            inbox_ids: vec![10],
        }
    }

    fn channel() -> mpsc::Sender<Envelope> {
        let (tx, rx) = mpsc::channel(8);
        // Keep the receiver alive for the duration of the test.
        std::mem::forget(rx);
        tx
    }

    #[tokio::test]
    async fn register_partitions_by_role() {
        let registry = ConnectionRegistry::new();

        let agent = registry.register(agent_params(5), channel()).await.unwrap();
        let contact = registry
            .register(contact_params(9), channel())
            .await
            .unwrap();

        assert_eq!(registry.len().await, 2);
        assert_eq!(registry.agents().await.len(), 1);
        assert_eq!(registry.contacts().await.len(), 1);
        assert!(registry.agent_online(5).await);
        assert!(!registry.agent_online(6).await);
        assert!(registry.get(agent.id()).await.is_some());
        assert!(registry.get(contact.id()).await.is_some());
    }

    #[tokio::test]
    async fn register_refuses_agent_without_user_id() {
        let registry = ConnectionRegistry::new();
        let mut params = agent_params(5);
        params.user_id = None;

        let error = registry.register(params, channel()).await.unwrap_err();
        assert!(matches!(error, RealtimeError::AdmissionRefused { .. }));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn register_refuses_contact_without_inbox_context() {
        let registry = ConnectionRegistry::new();
        let mut params = contact_params(9);
        params.inbox_ids.clear();

        let error = registry.register(params, channel()).await.unwrap_err();
        assert!(matches!(error, RealtimeError::AdmissionRefused { .. }));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn remove_is_idempotent_and_updates_both_sets() {
        let registry = ConnectionRegistry::new();
        let agent = registry.register(agent_params(5), channel()).await.unwrap();
        let id = agent.id().clone();

        assert!(registry.remove(&id).await.is_some());
        assert!(registry.remove(&id).await.is_none());
        assert!(registry.is_empty().await);
        assert!(registry.agents().await.is_empty());
    }

    #[tokio::test]
    async fn update_access_scope_swaps_inboxes_in_place() {
        let registry = ConnectionRegistry::new();
        let agent = registry.register(agent_params(5), channel()).await.unwrap();

        assert!(agent.can_access_inbox(10).await);
        registry
            .update_access_scope(agent.id(), vec![42])
            .await
            .unwrap();
        assert!(!agent.can_access_inbox(10).await);
        assert!(agent.can_access_inbox(42).await);
    }
}
