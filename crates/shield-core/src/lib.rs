//! Shield Core - Foundation types and traits for the Shield fraud-engine binding.
//!
//! This crate provides:
//! - The SDK configuration model and its positional engine encoding
//! - Error types shared across the binding
//! - The [`Engine`] trait describing the opaque native engine boundary
//! - A single-settlement [`Settler`]/[`Settlement`] pair for adapting
//!   native one-shot callbacks into futures
//! - Readiness policy and outcome types used by the readiness gate
//!
//! # Example
//!
//! ```rust
//! use shield_core::{Environment, LogLevel, ShieldConfig};
//!
//! let config = ShieldConfig::new("S1", "K1")
//!     .with_log_level(LogLevel::Info)
//!     .with_environment(Environment::Production);
//!
//! let args = config.to_init_args(false);
//! assert_eq!(args.log_level, 2);
//! assert_eq!(args.environment, 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod config;
pub mod engine;
pub mod error;
pub mod readiness;
pub mod settle;
pub mod types;

pub use config::{BlockedDialog, Environment, LogLevel, ShieldConfig};
pub use engine::{Engine, InitArgs, NativeCallback};
pub use error::{ShieldError, ShieldResult};
pub use readiness::{
    DEFAULT_GRACE_MS, DEFAULT_READINESS_TIMEOUT_MS, Readiness, ReadinessOptions, ReadinessPolicy,
};
pub use settle::{Settlement, Settler, settle_pair};
pub use types::{Attributes, CrossPlatformDescriptor, DeviceResult};
