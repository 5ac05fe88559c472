//! Topic pub/sub: string-keyed fan-out with no business semantics.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::client::{Client, ClientId};
use crate::error::RealtimeError;
use crate::wire::Envelope;

#[derive(Default)]
struct TopicsInner {
    /// Subscribers in registration order.
    topics: HashMap<String, Vec<Arc<Client>>>,
    /// Reverse index for `unsubscribe_all`.
    memberships: HashMap<ClientId, HashSet<String>>,
}

/// Outcome of a publish: how many subscribers took the frame, and which
/// ones had a dead channel and need removal.
#[derive(Debug, Default)]
pub struct PublishOutcome {
    pub delivered: usize,
    pub failed: Vec<ClientId>,
}

/// Maps topic strings to subscriber sets. Both maps live under one lock so
/// they can never disagree.
pub struct TopicRegistry {
    inner: RwLock<TopicsInner>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TopicsInner::default()),
        }
    }

    /// Idempotent: subscribing twice leaves a single membership.
    pub async fn subscribe(&self, client: &Arc<Client>, topic: &str) {
        let mut inner = self.inner.write().await;

        let subscribers = inner.topics.entry(topic.to_string()).or_default();
        if !subscribers.iter().any(|c| c.id() == client.id()) {
            subscribers.push(client.clone());
        }

        inner
            .memberships
            .entry(client.id().clone())
            .or_default()
            .insert(topic.to_string());
    }

    /// Remove one membership; the topic entry is deleted when its last
    /// subscriber leaves.
    pub async fn unsubscribe(&self, client_id: &ClientId, topic: &str) {
        let mut inner = self.inner.write().await;

        if let Some(subscribers) = inner.topics.get_mut(topic) {
            subscribers.retain(|c| c.id() != client_id);
            if subscribers.is_empty() {
                inner.topics.remove(topic);
            }
        }

        if let Some(memberships) = inner.memberships.get_mut(client_id) {
            memberships.remove(topic);
            if memberships.is_empty() {
                inner.memberships.remove(client_id);
            }
        }
    }

    /// Drop every membership of a client. Called once at disconnect.
    pub async fn unsubscribe_all(&self, client_id: &ClientId) {
        let mut inner = self.inner.write().await;

        let Some(topics) = inner.memberships.remove(client_id) else {
            return;
        };

        for topic in topics {
            if let Some(subscribers) = inner.topics.get_mut(&topic) {
                subscribers.retain(|c| c.id() != client_id);
                if subscribers.is_empty() {
                    inner.topics.remove(&topic);
                }
            }
        }
    }

    /// Deliver to every current subscriber in registration order. A dead
    /// subscriber never stops delivery to the rest; it is reported back for
    /// removal instead.
    pub async fn publish(&self, topic: &str, envelope: &Envelope) -> PublishOutcome {
        let subscribers = {
            let inner = self.inner.read().await;
            inner.topics.get(topic).cloned().unwrap_or_default()
        };

        let mut outcome = PublishOutcome::default();
        for client in subscribers {
            match client.send(envelope.clone()) {
                Ok(()) => outcome.delivered += 1,
                Err(RealtimeError::ClientGone) => {
                    outcome.failed.push(client.id().clone());
                }
                Err(_) => {}
            }
        }

        debug!(
            topic,
            event = %envelope.event,
            delivered = outcome.delivered,
            failed = outcome.failed.len(),
            "published"
        );
        outcome
    }

    pub async fn subscribers(&self, topic: &str) -> Vec<Arc<Client>> {
        let inner = self.inner.read().await;
        inner.topics.get(topic).cloned().unwrap_or_default()
    }

    pub async fn contains_topic(&self, topic: &str) -> bool {
        self.inner.read().await.topics.contains_key(topic)
    }

    pub async fn is_subscribed(&self, client_id: &ClientId, topic: &str) -> bool {
        let inner = self.inner.read().await;
        inner
            .memberships
            .get(client_id)
            .map(|topics| topics.contains(topic))
            .unwrap_or(false)
    }

    pub async fn topic_count(&self) -> usize {
        self.inner.read().await.topics.len()
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientRole, ConnectParams};
    use crate::registry::ConnectionRegistry;
    use crate::wire::Envelope;
    use tokio::sync::mpsc;

    async fn connected_client(
        registry: &ConnectionRegistry,
        contact_id: i64,
    ) -> (Arc<Client>, mpsc::Receiver<Envelope>) {
        let (tx, rx) = mpsc::channel(16);
        let client = registry
            .register(
                ConnectParams {
                    role: ClientRole::Contact,
                    company_id: 1,
                    user_id: None,
                    contact_id: Some(contact_id),
                    inbox_ids: vec![1],
                },
                tx,
            )
            .await
            .unwrap();
        (client, rx)
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber_exactly_once() {
        let registry = ConnectionRegistry::new();
        let topics = TopicRegistry::new();

        let (a, mut rx_a) = connected_client(&registry, 1).await;
        let (b, mut rx_b) = connected_client(&registry, 2).await;

        topics.subscribe(&a, "conversation:1").await;
        topics.subscribe(&a, "conversation:1").await; // idempotent
        topics.subscribe(&b, "conversation:1").await;

        let envelope = Envelope::new("message_created", serde_json::json!({"id": 1}));
        let outcome = topics.publish("conversation:1", &envelope).await;

        assert_eq!(outcome.delivered, 2);
        assert!(outcome.failed.is_empty());
        assert_eq!(rx_a.recv().await.unwrap().event, "message_created");
        assert_eq!(rx_b.recv().await.unwrap().event, "message_created");
        assert!(rx_a.try_recv().is_err(), "no duplicate delivery");
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let registry = ConnectionRegistry::new();
        let topics = TopicRegistry::new();

        let (a, mut rx_a) = connected_client(&registry, 1).await;
        topics.subscribe(&a, "conversation:1").await;
        topics.unsubscribe(a.id(), "conversation:1").await;

        let envelope = Envelope::new("message_created", serde_json::Value::Null);
        let outcome = topics.publish("conversation:1", &envelope).await;

        assert_eq!(outcome.delivered, 0);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn empty_topics_are_garbage_collected() {
        let registry = ConnectionRegistry::new();
        let topics = TopicRegistry::new();

        let (a, _rx_a) = connected_client(&registry, 1).await;
        topics.subscribe(&a, "conversation:1").await;
        assert!(topics.contains_topic("conversation:1").await);

        topics.unsubscribe(a.id(), "conversation:1").await;
        assert!(!topics.contains_topic("conversation:1").await);
        assert_eq!(topics.topic_count().await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_all_clears_every_membership() {
        let registry = ConnectionRegistry::new();
        let topics = TopicRegistry::new();

        let (a, _rx_a) = connected_client(&registry, 1).await;
        topics.subscribe(&a, "conversation:1").await;
        topics.subscribe(&a, "contact:1").await;
        topics.subscribe(&a, "company:1").await;

        topics.unsubscribe_all(a.id()).await;

        assert_eq!(topics.topic_count().await, 0);
        assert!(!topics.is_subscribed(a.id(), "conversation:1").await);

        // Publish into the vacated topic neither errors nor delivers.
        let outcome = topics
            .publish(
                "conversation:1",
                &Envelope::new("message_created", serde_json::Value::Null),
            )
            .await;
        assert_eq!(outcome.delivered, 0);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn dead_subscriber_does_not_block_the_rest() {
        let registry = ConnectionRegistry::new();
        let topics = TopicRegistry::new();

        let (dead, rx_dead) = connected_client(&registry, 1).await;
        let (alive, mut rx_alive) = connected_client(&registry, 2).await;

        topics.subscribe(&dead, "company:1").await;
        topics.subscribe(&alive, "company:1").await;
        drop(rx_dead); // simulate a broken pipe

        let outcome = topics
            .publish(
                "company:1",
                &Envelope::new("inbox_updated", serde_json::Value::Null),
            )
            .await;

        assert_eq!(outcome.delivered, 1);
        assert_eq!(outcome.failed, vec![dead.id().clone()]);
        assert_eq!(rx_alive.recv().await.unwrap().event, "inbox_updated");
    }
}
