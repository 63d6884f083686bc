//! Shield Telemetry - Logging and tracing for the Shield fraud-engine binding.
//!
//! This crate provides:
//! - Configurable `tracing` subscriber setup with multiple formats and targets
//! - Operation contexts for correlating the calls a session makes
//!
//! # Example
//!
//! ```rust,no_run
//! use shield_telemetry::{LogConfig, LogFormat, OperationContext, setup_logging};
//!
//! # fn main() -> Result<(), shield_telemetry::TelemetryError> {
//! let config = LogConfig::new("info")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("shield_bridge=debug");
//!
//! setup_logging(&config)?;
//!
//! let ctx = OperationContext::new("shield-session").with_operation("initialize");
//! let span = ctx.span();
//! let _guard = span.enter();
//! tracing::info!("Initializing engine");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{OperationContext, OperationGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
