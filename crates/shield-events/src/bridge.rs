//! Forwarding of engine `success`/`error` events to application callbacks.
//!
//! A bridge holds at most one active callback registration. Registering
//! again replaces the previous registration. Each registration returns a
//! [`Registration`] handle; releasing it (explicitly or by dropping it)
//! removes the subscription, unless a newer registration has already
//! superseded it.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tracing::debug;

use crate::bus::EventBus;
use crate::event::{ERROR_EVENT, SUCCESS_EVENT, ShieldEvent};
use crate::subscriber::{EventSubscriber, SubscriberId};

type Handler = Arc<dyn Fn(Value) + Send + Sync>;

/// Optional success and failure handlers supplied by the application.
#[derive(Clone, Default)]
pub struct ShieldCallbacks {
    on_success: Option<Handler>,
    on_failure: Option<Handler>,
}

impl fmt::Debug for ShieldCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

impl ShieldCallbacks {
    /// Create an empty callback pair.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for `success` payloads.
    #[must_use]
    pub fn on_success(mut self, handler: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(handler));
        self
    }

    /// Handler for `error` payloads.
    #[must_use]
    pub fn on_failure(mut self, handler: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.on_failure = Some(Arc::new(handler));
        self
    }

    /// Whether a success handler was supplied.
    #[must_use]
    pub fn has_success(&self) -> bool {
        self.on_success.is_some()
    }

    /// Whether a failure handler was supplied.
    #[must_use]
    pub fn has_failure(&self) -> bool {
        self.on_failure.is_some()
    }
}

struct CallbackSubscriber {
    callbacks: ShieldCallbacks,
}

impl EventSubscriber for CallbackSubscriber {
    fn on_event(&self, event: &ShieldEvent) {
        let (handler, payload) = match event {
            ShieldEvent::Success { payload, .. } => (&self.callbacks.on_success, payload),
            ShieldEvent::Error { payload, .. } => (&self.callbacks.on_failure, payload),
            ShieldEvent::DeviceResultState { .. } => return,
        };
        if let Some(handler) = handler {
            handler(payload.clone());
        }
    }

    fn accepts(&self, event: &ShieldEvent) -> bool {
        matches!(event.event_type(), SUCCESS_EVENT | ERROR_EVENT)
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "shield-callbacks"
    }
}

type Slot = Arc<Mutex<Option<SubscriberId>>>;

/// Redispatches engine events to the registered callback pair.
#[derive(Debug, Clone)]
pub struct EventBridge {
    bus: EventBus,
    current: Slot,
}

impl EventBridge {
    /// Create a bridge over the engine's emitter.
    #[must_use]
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            current: Arc::new(Mutex::new(None)),
        }
    }

    /// The emitter this bridge listens on.
    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Install a callback pair, replacing any previous registration.
    pub fn register(&self, callbacks: ShieldCallbacks) -> Registration {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(previous) = current.take() {
            self.bus.registry().unregister(previous);
            debug!("Replaced previous callback registration");
        }

        let id = self
            .bus
            .registry()
            .register(Arc::new(CallbackSubscriber { callbacks }));
        *current = Some(id);

        Registration {
            bus: self.bus.clone(),
            current: Arc::clone(&self.current),
            id,
            released: false,
        }
    }

    /// Whether a callback registration is active.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Handle to a callback registration.
///
/// Dropping the handle releases the registration.
#[must_use = "dropping a Registration immediately removes the callbacks"]
pub struct Registration {
    bus: EventBus,
    current: Slot,
    id: SubscriberId,
    released: bool,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

impl Registration {
    /// Subscriber identifier backing this registration.
    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether this registration is still the bridge's active one.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.released
            && *self.current.lock().unwrap_or_else(PoisonError::into_inner) == Some(self.id)
    }

    /// Release the registration.
    ///
    /// Returns `true` if this handle was the active registration and its
    /// subscription was removed; releasing a superseded handle is a no-op.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != Some(self.id) {
            return false;
        }
        *current = None;
        let removed = self.bus.registry().unregister(self.id);
        debug!("Callback registration released");
        removed
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.release();
    }
}
