//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shield_events::prelude::*;` to import all essential types.

// Event bus
pub use crate::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver, ReadinessReceiver};

// Events
pub use crate::{EventMetadata, ShieldEvent};

// Callback bridge
pub use crate::{EventBridge, Registration, ShieldCallbacks};

// Subscriber system
pub use crate::{EventFilter, EventSubscriber, FilterSubscriber, SubscriberId, SubscriberRegistry};
