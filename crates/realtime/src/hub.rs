//! Hub tying the connection registry to the topic registry.
//!
//! Closes the failure loop between the two: a publish that hits a dead
//! subscriber removes that subscriber from both, and a disconnect clears
//! every topic membership before the client is dropped.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use crate::client::{Client, ClientId, ConnectParams};
use crate::error::RealtimeResult;
use crate::registry::ConnectionRegistry;
use crate::topics::TopicRegistry;
use crate::wire::Envelope;

pub struct RealtimeHub {
    registry: Arc<ConnectionRegistry>,
    topics: Arc<TopicRegistry>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            topics: Arc::new(TopicRegistry::new()),
        }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn topics(&self) -> &Arc<TopicRegistry> {
        &self.topics
    }

    pub async fn connect(
        &self,
        params: ConnectParams,
        sender: mpsc::Sender<Envelope>,
    ) -> RealtimeResult<Arc<Client>> {
        self.registry.register(params, sender).await
    }

    /// Idempotent teardown: every topic membership first, then the registry
    /// entry, so a concurrent publish can at worst hit the closed channel.
    pub async fn disconnect(&self, client_id: &ClientId) -> Option<Arc<Client>> {
        self.topics.unsubscribe_all(client_id).await;
        let removed = self.registry.remove(client_id).await;
        if let Some(ref client) = removed {
            info!(client_id = %client.id(), role = client.role().as_str(), "client disconnected");
        }
        removed
    }

    pub async fn subscribe(&self, client: &Arc<Client>, topic: &str) {
        self.topics.subscribe(client, topic).await;
    }

    pub async fn unsubscribe(&self, client_id: &ClientId, topic: &str) {
        self.topics.unsubscribe(client_id, topic).await;
    }

    /// Publish to a topic and reap any subscriber whose connection turned
    /// out to be dead. Returns the number of successful deliveries.
    pub async fn publish(&self, topic: &str, envelope: Envelope) -> usize {
        let outcome = self.topics.publish(topic, &envelope).await;
        for client_id in &outcome.failed {
            self.disconnect(client_id).await;
        }
        outcome.delivered
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
