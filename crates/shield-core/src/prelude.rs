//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shield_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{ShieldError, ShieldResult};

// Configuration
pub use crate::{BlockedDialog, Environment, LogLevel, ShieldConfig};

// Engine boundary
pub use crate::{Attributes, CrossPlatformDescriptor, DeviceResult, Engine, InitArgs, NativeCallback};

// Readiness
pub use crate::{Readiness, ReadinessOptions, ReadinessPolicy};

// Settlement
pub use crate::{Settlement, Settler, settle_pair};
