//! In-process domain event dispatcher.
//!
//! Decouples "something happened" from "who needs to know". Every listener
//! invocation runs as its own tokio task: listeners never block each other
//! or the dispatching call site, listener failures are logged and contained,
//! and `dispatch` returns before any listener has necessarily run. Callers
//! must not assume side effects have landed when it returns.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

/// A domain-level occurrence. The dispatcher is generic over the concrete
/// event type so this crate stays free of business semantics.
pub trait DomainEvent: Clone + Send + Sync + 'static {
    type Kind: Copy + Eq + Hash + std::fmt::Debug + Send + Sync + 'static;

    fn kind(&self) -> Self::Kind;
}

#[async_trait]
pub trait EventListener<E: DomainEvent>: Send + Sync {
    async fn on_event(&self, event: E) -> anyhow::Result<()>;
}

pub struct EventDispatcher<E: DomainEvent> {
    listeners: RwLock<HashMap<E::Kind, Vec<Arc<dyn EventListener<E>>>>>,
}

impl<E: DomainEvent> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Register a listener for one event kind. Registration happens once at
    /// process start; there is deliberately no unsubscribe.
    pub async fn subscribe(&self, kind: E::Kind, listener: Arc<dyn EventListener<E>>) {
        let mut listeners = self.listeners.write().await;
        listeners.entry(kind).or_default().push(listener);
    }

    /// Register the same listener for several kinds at once.
    pub async fn subscribe_many(&self, kinds: &[E::Kind], listener: Arc<dyn EventListener<E>>) {
        for kind in kinds {
            self.subscribe(*kind, listener.clone()).await;
        }
    }

    /// Fan the event out to every listener registered for its kind, one
    /// detached task per listener. Returns the number of tasks spawned.
    pub async fn dispatch(&self, event: E) -> usize {
        let listeners = {
            let listeners = self.listeners.read().await;
            listeners.get(&event.kind()).cloned().unwrap_or_default()
        };

        let spawned = listeners.len();
        for listener in listeners {
            let event = event.clone();
            tokio::spawn(async move {
                let kind = event.kind();
                if let Err(error) = listener.on_event(event).await {
                    warn!(?error, event_kind = ?kind, "event listener failed");
                }
            });
        }
        spawned
    }

    pub async fn listener_count(&self, kind: E::Kind) -> usize {
        let listeners = self.listeners.read().await;
        listeners.get(&kind).map(Vec::len).unwrap_or(0)
    }
}

impl<E: DomainEvent> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, timeout};

    #[derive(Debug, Clone)]
    enum TestEvent {
        Ping(u32),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum TestKind {
        Ping,
    }

    impl DomainEvent for TestEvent {
        type Kind = TestKind;

        fn kind(&self) -> TestKind {
            match self {
                TestEvent::Ping(_) => TestKind::Ping,
            }
        }
    }

    struct CountingListener {
        seen: AtomicUsize,
    }

    #[async_trait]
    impl EventListener<TestEvent> for CountingListener {
        async fn on_event(&self, _event: TestEvent) -> anyhow::Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct NotifyingListener {
        delay: Duration,
        done: mpsc::UnboundedSender<()>,
    }

    #[async_trait]
    impl EventListener<TestEvent> for NotifyingListener {
        async fn on_event(&self, _event: TestEvent) -> anyhow::Result<()> {
            sleep(self.delay).await;
            let _ = self.done.send(());
            Ok(())
        }
    }

    struct FailingListener;

    #[async_trait]
    impl EventListener<TestEvent> for FailingListener {
        async fn on_event(&self, _event: TestEvent) -> anyhow::Result<()> {
            anyhow::bail!("deliberate failure")
        }
    }

    #[tokio::test]
    async fn dispatch_invokes_every_listener_for_the_kind() {
        let dispatcher: EventDispatcher<TestEvent> = EventDispatcher::new();
        let first = Arc::new(CountingListener {
            seen: AtomicUsize::new(0),
        });
        let second = Arc::new(CountingListener {
            seen: AtomicUsize::new(0),
        });

        dispatcher.subscribe(TestKind::Ping, first.clone()).await;
        dispatcher.subscribe(TestKind::Ping, second.clone()).await;

        let spawned = dispatcher.dispatch(TestEvent::Ping(1)).await;
        assert_eq!(spawned, 2);

        // Listeners run on their own tasks; give them a beat.
        tokio::task::yield_now().await;
        sleep(Duration::from_millis(20)).await;

        assert_eq!(first.seen.load(Ordering::SeqCst), 1);
        assert_eq!(second.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn slow_listener_does_not_delay_fast_listener() {
        let dispatcher: EventDispatcher<TestEvent> = EventDispatcher::new();

        let (fast_tx, mut fast_rx) = mpsc::unbounded_channel();
        let (slow_tx, mut slow_rx) = mpsc::unbounded_channel();
        let fast = Arc::new(NotifyingListener {
            delay: Duration::from_millis(1),
            done: fast_tx,
        });
        let slow = Arc::new(NotifyingListener {
            delay: Duration::from_secs(5),
            done: slow_tx,
        });

        dispatcher.subscribe(TestKind::Ping, slow).await;
        dispatcher.subscribe(TestKind::Ping, fast).await;

        dispatcher.dispatch(TestEvent::Ping(1)).await;
        dispatcher.dispatch(TestEvent::Ping(2)).await;

        // Both fast invocations finish while both slow ones are still
        // sleeping.
        timeout(Duration::from_millis(500), fast_rx.recv())
            .await
            .expect("fast listener should complete promptly");
        timeout(Duration::from_millis(500), fast_rx.recv())
            .await
            .expect("second fast invocation should also complete promptly");
        assert!(slow_rx.try_recv().is_err(), "slow listeners still running");
    }

    #[tokio::test]
    async fn failing_listener_does_not_affect_siblings() {
        let dispatcher: EventDispatcher<TestEvent> = EventDispatcher::new();
        let counter = Arc::new(CountingListener {
            seen: AtomicUsize::new(0),
        });

        dispatcher.subscribe(TestKind::Ping, Arc::new(FailingListener)).await;
        dispatcher.subscribe(TestKind::Ping, counter.clone()).await;

        dispatcher.dispatch(TestEvent::Ping(1)).await;
        sleep(Duration::from_millis(20)).await;

        assert_eq!(counter.seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn dispatch_without_listeners_is_a_no_op() {
        let dispatcher: EventDispatcher<TestEvent> = EventDispatcher::new();
        assert_eq!(dispatcher.dispatch(TestEvent::Ping(1)).await, 0);
    }
}
