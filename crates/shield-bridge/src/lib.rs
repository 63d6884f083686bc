//! Session facade for the Shield fraud engine.
//!
//! [`ShieldSession`] owns the engine handle and the emitter the engine
//! publishes on. It forwards configuration, bridges `success`/`error`
//! emissions to application callbacks and gates dependent calls on engine
//! readiness through [`ReadinessGate`].
//!
//! # Example
//!
//! ```rust,no_run
//! # async fn run(engine: std::sync::Arc<dyn shield_core::Engine>, bus: shield_events::EventBus) {
//! use shield_bridge::prelude::*;
//!
//! let session = ShieldSession::new(engine, bus);
//! let callbacks = ShieldCallbacks::new().on_success(|payload| println!("{payload}"));
//! session
//!     .initialize(&ShieldConfig::new("site", "secret"), Some(callbacks))
//!     .await
//!     .unwrap();
//!
//! if session.ready().await.is_ready() {
//!     let id = session.session_id().await.unwrap();
//!     println!("session {id}");
//! }
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

mod gate;
mod session;

pub use gate::ReadinessGate;
pub use session::ShieldSession;

use shield_core::CrossPlatformDescriptor;

/// Descriptor naming this binding, forwarded to the engine before
/// initialization.
#[must_use]
pub fn binding_descriptor() -> CrossPlatformDescriptor {
    CrossPlatformDescriptor::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
