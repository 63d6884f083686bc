//! The native engine boundary.
//!
//! Every call crosses an opaque asynchronous boundary into the fraud
//! engine. Events the engine raises (`success`, `error`,
//! `device_result_state`) are not part of this trait; the engine adapter
//! publishes them on the emitter it shares with the session.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::BlockedDialog;
use crate::error::ShieldResult;
use crate::types::Attributes;

/// One-shot callback handed to the engine for a dual-callback primitive.
pub type NativeCallback = Box<dyn FnOnce(Value) + Send + 'static>;

/// Positional arguments of the engine initializer.
///
/// Field order mirrors the engine signature:
/// `(site_id, secret_key, has_callbacks, blocked_dialog, log_level, environment)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitArgs {
    /// Site identifier.
    pub site_id: String,
    /// Secret key.
    pub secret_key: String,
    /// Whether the binding registered success/error listeners.
    pub has_callbacks: bool,
    /// Blocked-device dialog, or `None`.
    pub blocked_dialog: Option<BlockedDialog>,
    /// Log level code (`1..=3`).
    pub log_level: u8,
    /// Environment code (`0..=2`).
    pub environment: u8,
}

/// The opaque native fraud engine.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Initialize the engine with positional arguments.
    async fn initialize(&self, args: InitArgs) -> ShieldResult<()>;

    /// Attribute telemetry to the binding that drives the engine.
    fn set_cross_platform_parameters(&self, name: &str, version: &str);

    /// Whether the engine has been initialized.
    async fn is_initialized(&self) -> ShieldResult<bool>;

    /// Arm the engine's one-shot readiness broadcast.
    ///
    /// When device analysis completes the engine emits a
    /// `device_result_state` event with status `isSDKReady`.
    fn set_readiness_listener(&self);

    /// Current session token, or `None` if no session exists yet.
    async fn session_id(&self) -> ShieldResult<Option<String>>;

    /// Send screen attributes. Fire-and-forget.
    fn send_attributes(&self, screen_name: &str, attributes: Attributes);

    /// Fetch the latest device result.
    ///
    /// The engine is expected to invoke exactly one of the callbacks.
    fn latest_device_result(&self, on_success: NativeCallback, on_error: NativeCallback);
}
