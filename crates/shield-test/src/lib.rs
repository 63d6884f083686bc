//! Shield Test - Shared test utilities for the Shield binding.
//!
//! Provides [`MockEngine`], an in-process stand-in for the native engine
//! that records every call and publishes scripted events on a shared
//! [`EventBus`](shield_events::EventBus), plus fixtures for common values.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! shield-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use shield_test::{MockEngine, test_config};
//!
//! let bus = shield_events::EventBus::new();
//! let engine = MockEngine::new(bus.clone()).with_ready_on_arm();
//! let session = shield_bridge::ShieldSession::new(engine.handle(), bus);
//! session.initialize(&test_config(), None).await.unwrap();
//! assert_eq!(engine.init_calls().len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::{DeviceResultMode, MockEngine};

/// Install a test `tracing` subscriber honoring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
