//! Event bus carrying engine emissions to subscribers.

use std::sync::Arc;
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tracing::{debug, trace, warn};

use crate::event::ShieldEvent;
use crate::subscriber::SubscriberRegistry;

/// Default channel capacity for the event bus.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting engine events to all subscribers.
///
/// This is the emitter shared between the engine adapter (which publishes)
/// and the session (which subscribes). Events are delivered in publish order.
///
/// **WARNING:** Synchronous subscribers are shared across clones. Storing a
/// cloned `EventBus` inside a synchronous subscriber creates an `Arc`
/// reference cycle.
#[derive(Debug)]
pub struct EventBus {
    /// Sender for broadcasting events.
    sender: broadcast::Sender<Arc<ShieldEvent>>,
    /// Registry for synchronous subscribers.
    registry: Arc<SubscriberRegistry>,
    /// Count of readiness broadcasts, kept apart from the event stream.
    readiness: Arc<watch::Sender<u64>>,
    /// Channel capacity.
    capacity: usize,
}

impl EventBus {
    /// Create a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new event bus with specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        let (readiness, _) = watch::channel(0);
        Self {
            sender,
            registry: Arc::new(SubscriberRegistry::new()),
            readiness: Arc::new(readiness),
            capacity,
        }
    }

    /// Publish an event to all subscribers.
    ///
    /// Broadcasts to async receivers first, then notifies synchronous
    /// subscribers inline.
    ///
    /// Returns the number of async receivers that received the event.
    pub fn publish(&self, event: ShieldEvent) -> usize {
        let event = Arc::new(event);

        trace!(event_type = %event.event_type(), "Publishing event");

        let count = if let Ok(c) = self.sender.send(Arc::clone(&event)) {
            debug!(
                event_type = %event.event_type(),
                receiver_count = c,
                "Event published"
            );
            c
        } else {
            // No receivers - this is fine
            trace!(event_type = %event.event_type(), "No receivers for event");
            0
        };

        if event.is_sdk_ready() {
            self.readiness.send_modify(|count| *count = count.wrapping_add(1));
        }

        self.registry.notify(&event);

        count
    }

    /// Publish a named native emission.
    ///
    /// Returns `None` when the name is unknown or the payload malformed;
    /// such emissions are dropped.
    pub fn publish_native(&self, name: &str, payload: Value) -> Option<usize> {
        let Some(event) = ShieldEvent::from_native(name, payload) else {
            warn!(event_name = name, "Dropping unrecognized native emission");
            return None;
        };
        Some(self.publish(event))
    }

    /// Subscribe to all events.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), None)
    }

    /// Subscribe to events with a specific native name.
    ///
    /// Dropping the receiver removes the subscription.
    #[must_use]
    pub fn subscribe_named(&self, event_name: &'static str) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), Some(event_name))
    }

    /// Watch for readiness broadcasts published from now on.
    ///
    /// Readiness is counted outside the broadcast buffer, so a burst of other
    /// events cannot push it out. Dropping the receiver removes the watch.
    #[must_use]
    pub fn subscribe_readiness(&self) -> ReadinessReceiver {
        ReadinessReceiver::new(self.readiness.subscribe())
    }

    /// Get the synchronous subscriber registry.
    #[must_use]
    pub fn registry(&self) -> &SubscriberRegistry {
        &self.registry
    }

    /// Number of live async receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Number of live readiness watchers.
    #[must_use]
    pub fn readiness_watchers(&self) -> usize {
        self.readiness.receiver_count()
    }

    /// Get the current number of active subscribers (both async and synchronous).
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender
            .receiver_count()
            .saturating_add(self.registry.len())
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        // Share the same sender and the same subscriber registry
        Self {
            sender: self.sender.clone(),
            registry: Arc::clone(&self.registry),
            readiness: Arc::clone(&self.readiness),
            capacity: self.capacity,
        }
    }
}

/// Receiver for events from the event bus.
#[derive(Debug)]
pub struct EventReceiver {
    receiver: broadcast::Receiver<Arc<ShieldEvent>>,
    /// If set, only events with this native name are yielded.
    event_name: Option<&'static str>,
}

impl EventReceiver {
    pub(crate) fn new(
        receiver: broadcast::Receiver<Arc<ShieldEvent>>,
        event_name: Option<&'static str>,
    ) -> Self {
        Self {
            receiver,
            event_name,
        }
    }

    fn matches(&self, event: &ShieldEvent) -> bool {
        self.event_name
            .is_none_or(|name| event.event_type() == name)
    }

    /// Receive the next matching event.
    ///
    /// Returns `None` once every bus handle has been dropped. Lagged events
    /// are logged and skipped.
    pub async fn recv(&mut self) -> Option<Arc<ShieldEvent>> {
        let mut skipped: usize = 0;
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                    skipped = skipped.wrapping_add(1);
                    if skipped.is_multiple_of(100) {
                        tokio::task::yield_now().await;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Try to receive the next matching event without blocking.
    pub fn try_recv(&mut self) -> Option<Arc<ShieldEvent>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(event);
                    }
                },
                Err(broadcast::error::TryRecvError::Lagged(count)) => {
                    warn!(skipped = count, "Event receiver lagged, events dropped");
                },
                Err(
                    broadcast::error::TryRecvError::Empty | broadcast::error::TryRecvError::Closed,
                ) => return None,
            }
        }
    }
}

/// Receiver for readiness broadcasts.
#[derive(Debug)]
pub struct ReadinessReceiver {
    receiver: watch::Receiver<u64>,
    /// Broadcast count already accounted for.
    seen: u64,
}

impl ReadinessReceiver {
    fn new(mut receiver: watch::Receiver<u64>) -> Self {
        let seen = *receiver.borrow_and_update();
        Self { receiver, seen }
    }

    /// Wait for the next readiness broadcast.
    ///
    /// Several broadcasts since the last call resolve a single wait. Never
    /// completes once every bus handle has been dropped.
    pub async fn ready(&mut self) {
        loop {
            if self.try_ready() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Whether a readiness broadcast arrived since the last check.
    pub fn try_ready(&mut self) -> bool {
        let current = *self.receiver.borrow_and_update();
        if current == self.seen {
            return false;
        }
        self.seen = current;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DEVICE_RESULT_STATE_EVENT;
    use crate::subscriber::FilterSubscriber;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_event_bus_creation() {
        let bus = EventBus::new();
        assert_eq!(bus.capacity(), DEFAULT_CHANNEL_CAPACITY);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        let count = bus.publish(ShieldEvent::success(json!({"score": 0.9})));
        assert_eq!(count, 1);

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.event_type(), "success");
        assert_eq!(event.payload(), Some(&json!({"score": 0.9})));
    }

    #[tokio::test]
    async fn test_no_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(ShieldEvent::sdk_ready()), 0);
    }

    #[tokio::test]
    async fn test_named_subscription_filters() {
        let bus = EventBus::new();
        let mut readiness = bus.subscribe_named(DEVICE_RESULT_STATE_EVENT);

        bus.publish(ShieldEvent::success(json!({})));
        bus.publish(ShieldEvent::error(json!({})));
        assert!(readiness.try_recv().is_none());

        bus.publish(ShieldEvent::sdk_ready());
        assert!(readiness.try_recv().unwrap().is_sdk_ready());
    }

    #[tokio::test]
    async fn test_dropping_receiver_unsubscribes() {
        let bus = EventBus::new();
        let receiver = bus.subscribe_named(DEVICE_RESULT_STATE_EVENT);
        assert_eq!(bus.receiver_count(), 1);

        drop(receiver);
        assert_eq!(bus.receiver_count(), 0);
        assert_eq!(bus.publish(ShieldEvent::sdk_ready()), 0);
    }

    #[tokio::test]
    async fn test_publish_native() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        assert_eq!(
            bus.publish_native("device_result_state", json!({"status": "isSDKReady"})),
            Some(1)
        );
        assert!(receiver.try_recv().unwrap().is_sdk_ready());

        assert_eq!(bus.publish_native("unknown", json!({})), None);
        assert!(receiver.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_emission_order_preserved() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();

        for i in 0..5 {
            bus.publish(ShieldEvent::success(json!(i)));
        }
        for i in 0..5 {
            let event = receiver.recv().await.unwrap();
            assert_eq!(event.payload(), Some(&json!(i)));
        }
    }

    #[tokio::test]
    async fn test_cloned_bus_shares_registry() {
        let bus = EventBus::new();
        let cloned_bus = bus.clone();

        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        cloned_bus
            .registry()
            .register(Arc::new(FilterSubscriber::new("sync", move |_| {
                counter_clone.fetch_add(1, Ordering::SeqCst);
            })));

        bus.publish(ShieldEvent::sdk_ready());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_recv_returns_none_when_closed() {
        let bus = EventBus::new();
        let mut receiver = bus.subscribe();
        drop(bus);
        assert!(receiver.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_readiness_outlasts_event_burst() {
        let bus = EventBus::with_capacity(4);
        let mut events = bus.subscribe_named(DEVICE_RESULT_STATE_EVENT);
        let mut readiness = bus.subscribe_readiness();

        bus.publish(ShieldEvent::sdk_ready());
        for i in 0..16 {
            bus.publish(ShieldEvent::success(json!(i)));
        }

        // The broadcast fell out of the event buffer but is still counted.
        assert!(events.try_recv().is_none());
        assert!(readiness.try_ready());
        assert!(!readiness.try_ready());
    }

    #[tokio::test]
    async fn test_readiness_only_counts_later_broadcasts() {
        let bus = EventBus::new();
        bus.publish(ShieldEvent::sdk_ready());

        let mut readiness = bus.subscribe_readiness();
        assert_eq!(bus.readiness_watchers(), 1);
        assert!(!readiness.try_ready());

        bus.publish(ShieldEvent::device_result_state("warmingUp"));
        assert!(!readiness.try_ready());

        bus.publish(ShieldEvent::sdk_ready());
        readiness.ready().await;

        drop(readiness);
        assert_eq!(bus.readiness_watchers(), 0);
    }

    #[tokio::test]
    async fn test_lagged_receiver_keeps_going() {
        let bus = EventBus::with_capacity(2);
        let mut receiver = bus.subscribe();

        for i in 0..4 {
            bus.publish(ShieldEvent::success(json!(i)));
        }

        // The oldest events were overwritten; the receiver resumes at the
        // oldest retained one.
        let event = receiver.recv().await.unwrap();
        assert_eq!(event.payload(), Some(&json!(2)));
    }
}
