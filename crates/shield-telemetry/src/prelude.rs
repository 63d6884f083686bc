//! Prelude module - commonly used types for convenient import.
//!
//! Use `use shield_telemetry::prelude::*;` to import all essential types.

// Errors
pub use crate::{TelemetryError, TelemetryResult};

// Logging configuration
pub use crate::{FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget};

// Setup functions
pub use crate::{setup_default_logging, setup_logging};

// Operation context
pub use crate::{OperationContext, OperationGuard};
