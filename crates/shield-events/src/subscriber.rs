//! Event subscriber trait and registry.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::event::ShieldEvent;

/// Filter function type for event subscribers.
pub type EventFilter = Box<dyn Fn(&ShieldEvent) -> bool + Send + Sync>;

/// Trait for synchronous event subscribers.
///
/// `on_event` runs inline on the publishing task, so it should return
/// quickly. For heavy processing use an [`EventReceiver`](crate::EventReceiver).
pub trait EventSubscriber: Send + Sync {
    /// Called when an event is published.
    fn on_event(&self, event: &ShieldEvent);

    /// Optional filter for event types.
    ///
    /// Return `true` to receive the event, `false` to skip it.
    /// Default implementation accepts all events.
    fn accepts(&self, event: &ShieldEvent) -> bool {
        let _ = event;
        true
    }

    /// Optional name for debugging.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Registration handle for a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Registry for managing synchronous event subscribers.
#[derive(Default)]
pub struct SubscriberRegistry {
    subscribers: RwLock<HashMap<SubscriberId, Arc<dyn EventSubscriber>>>,
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscriber_count", &self.len())
            .finish()
    }
}

impl SubscriberRegistry {
    /// Create a new subscriber registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a subscriber.
    ///
    /// Returns a handle that can be used to unregister the subscriber.
    pub fn register(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriberId {
        let id = SubscriberId::new();
        let name = subscriber.name().to_string();

        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, subscriber);

        debug!(subscriber_name = %name, "Subscriber registered");
        id
    }

    /// Unregister a subscriber.
    ///
    /// Returns `true` if the subscriber was found and removed.
    pub fn unregister(&self, id: SubscriberId) -> bool {
        // Drop the subscriber after the write lock is released so a Drop impl
        // that publishes cannot deadlock against `notify`.
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        let found = removed.is_some();
        if found {
            debug!("Subscriber unregistered");
        }
        drop(removed);
        found
    }

    /// Check whether a subscriber is still registered.
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Notify all subscribers of an event.
    ///
    /// Subscribers are snapshotted before delivery, so a handler may
    /// register or unregister subscribers without deadlocking.
    pub fn notify(&self, event: &ShieldEvent) {
        let snapshot: Vec<(SubscriberId, Arc<dyn EventSubscriber>)> = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, sub)| (*id, Arc::clone(sub)))
            .collect();

        for (id, subscriber) in snapshot {
            if !subscriber.accepts(event) {
                continue;
            }

            trace!(
                subscriber_name = %subscriber.name(),
                event_type = %event.event_type(),
                "Notifying subscriber"
            );

            // Catch panics to prevent one subscriber from affecting others
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber.on_event(event);
            }));

            if let Err(e) = result {
                warn!(
                    subscriber_id = ?id,
                    subscriber_name = %subscriber.name(),
                    error = ?e,
                    "Subscriber panicked"
                );
            }
        }
    }

    /// Get the number of registered subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear all subscribers.
    pub fn clear(&self) {
        let drained: Vec<_> = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        debug!(count = drained.len(), "All subscribers cleared");
    }
}

/// A simple filter-based subscriber.
pub struct FilterSubscriber<F>
where
    F: Fn(&ShieldEvent) + Send + Sync,
{
    name: String,
    filter: Option<EventFilter>,
    handler: F,
}

impl<F> FilterSubscriber<F>
where
    F: Fn(&ShieldEvent) + Send + Sync,
{
    /// Create a new filter subscriber.
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            filter: None,
            handler,
        }
    }

    /// Add a filter to this subscriber.
    #[must_use]
    pub fn with_filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ShieldEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only accept events with the given native name.
    #[must_use]
    pub fn for_event(self, name: &'static str) -> Self {
        self.with_filter(move |event| event.event_type() == name)
    }
}

impl<F> EventSubscriber for FilterSubscriber<F>
where
    F: Fn(&ShieldEvent) + Send + Sync,
{
    fn on_event(&self, event: &ShieldEvent) {
        (self.handler)(event);
    }

    fn accepts(&self, event: &ShieldEvent) -> bool {
        match &self.filter {
            Some(f) => f(event),
            None => true,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSubscriber {
        name: String,
        count: AtomicUsize,
    }

    impl CountingSubscriber {
        fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                count: AtomicUsize::new(0),
            }
        }

        fn count(&self) -> usize {
            self.count.load(Ordering::SeqCst)
        }
    }

    impl EventSubscriber for CountingSubscriber {
        fn on_event(&self, _event: &ShieldEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_register_and_notify() {
        let registry = SubscriberRegistry::new();
        let subscriber = Arc::new(CountingSubscriber::new("counter"));

        registry.register(Arc::clone(&subscriber) as Arc<dyn EventSubscriber>);
        assert_eq!(registry.len(), 1);

        registry.notify(&ShieldEvent::success(json!({})));
        registry.notify(&ShieldEvent::error(json!({})));
        assert_eq!(subscriber.count(), 2);
    }

    #[test]
    fn test_unregister() {
        let registry = SubscriberRegistry::new();
        let subscriber = Arc::new(CountingSubscriber::new("counter"));

        let id = registry.register(Arc::clone(&subscriber) as Arc<dyn EventSubscriber>);
        assert!(registry.contains(id));
        assert!(registry.unregister(id));
        assert!(!registry.unregister(id));
        assert!(!registry.contains(id));

        registry.notify(&ShieldEvent::success(json!({})));
        assert_eq!(subscriber.count(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_filter_subscriber() {
        let registry = SubscriberRegistry::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let subscriber = FilterSubscriber::new("errors_only", move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
        .for_event("error");

        registry.register(Arc::new(subscriber));

        registry.notify(&ShieldEvent::success(json!({})));
        registry.notify(&ShieldEvent::error(json!({})));
        registry.notify(&ShieldEvent::sdk_ready());

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let registry = SubscriberRegistry::new();
        let counter = Arc::new(CountingSubscriber::new("counter"));

        registry.register(Arc::new(FilterSubscriber::new("panicker", |_| {
            panic!("handler failure");
        })));
        registry.register(Arc::clone(&counter) as Arc<dyn EventSubscriber>);

        registry.notify(&ShieldEvent::success(json!({})));
        assert_eq!(counter.count(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_unregister_from_handler() {
        let registry = Arc::new(SubscriberRegistry::new());
        let slot: Arc<std::sync::Mutex<Option<SubscriberId>>> =
            Arc::new(std::sync::Mutex::new(None));

        let weak = Arc::downgrade(&registry);
        let slot_clone = Arc::clone(&slot);
        let id = registry.register(Arc::new(FilterSubscriber::new("once", move |_| {
            if let (Some(registry), Some(id)) = (weak.upgrade(), *slot_clone.lock().unwrap()) {
                registry.unregister(id);
            }
        })));
        *slot.lock().unwrap() = Some(id);

        registry.notify(&ShieldEvent::sdk_ready());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clear() {
        let registry = SubscriberRegistry::new();
        registry.register(Arc::new(CountingSubscriber::new("a")));
        registry.register(Arc::new(CountingSubscriber::new("b")));
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
    }
}
