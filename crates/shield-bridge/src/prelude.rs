//! Commonly used types for embedding a Shield session.
//!
//! ```rust
//! use shield_bridge::prelude::*;
//! ```

pub use crate::{ReadinessGate, ShieldSession, binding_descriptor};

pub use shield_core::{
    Attributes, DeviceResult, Engine, Environment, LogLevel, Readiness, ReadinessOptions,
    ReadinessPolicy, ShieldConfig, ShieldError, ShieldResult,
};
pub use shield_events::{EventBus, ShieldCallbacks, ShieldEvent};
