//! Shield Events - Event bus and callback bridge for Shield engine events.
//!
//! This crate provides:
//! - Event types for the named emissions of the engine
//!   (`success`, `error`, `device_result_state`)
//! - A broadcast-based event bus the engine adapter publishes on
//! - A subscriber registry for synchronous handlers
//! - The [`EventBridge`], which forwards `success`/`error` payloads to the
//!   application's registered callback pair
//!
//! # Architecture
//!
//! The engine adapter publishes every native emission on an [`EventBus`].
//! There are two ways to subscribe:
//!
//! 1. **Async receivers**: `bus.subscribe()` or `bus.subscribe_named(name)`
//!    return an [`EventReceiver`]. Dropping the receiver unsubscribes it.
//!
//! 2. **Synchronous subscribers**: implementations of [`EventSubscriber`]
//!    registered with the bus registry are invoked inline, in publish order.
//!
//! Readiness broadcasts are also counted on a separate watch channel.
//! `bus.subscribe_readiness()` returns a [`ReadinessReceiver`] that cannot
//! lose a broadcast to a burst of other events.
//!
//! # Example
//!
//! ```rust
//! use shield_events::{EventBus, ShieldEvent};
//!
//! # async fn example() {
//! let bus = EventBus::new();
//! let mut receiver = bus.subscribe_named("device_result_state");
//!
//! bus.publish(ShieldEvent::sdk_ready());
//!
//! let event = receiver.recv().await.unwrap();
//! assert!(event.is_sdk_ready());
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bridge;
mod bus;
mod event;
mod subscriber;

pub use bridge::{EventBridge, Registration, ShieldCallbacks};
pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventReceiver, ReadinessReceiver};
pub use event::{
    DEVICE_RESULT_STATE_EVENT, ERROR_EVENT, EventMetadata, SDK_READY_STATUS, SUCCESS_EVENT,
    ShieldEvent,
};
pub use subscriber::{
    EventFilter, EventSubscriber, FilterSubscriber, SubscriberId, SubscriberRegistry,
};
