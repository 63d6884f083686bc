//! Error types for Shield binding operations.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur while driving the Shield engine.
#[derive(Debug, Error)]
pub enum ShieldError {
    /// A required configuration value is missing or malformed.
    #[error("invalid configuration: {field}: {message}")]
    InvalidConfiguration {
        /// The offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// The engine has not produced a session yet.
    #[error("shield engine is not initialized")]
    NotInitialized,

    /// Querying the engine's initialization state failed.
    ///
    /// The readiness gate never surfaces this to callers; it is downgraded
    /// to a not-ready outcome.
    #[error("readiness check failed: {0}")]
    ReadinessCheckFailed(String),

    /// The engine reported a failure. The payload is passed through verbatim.
    #[error("native call failed: {0}")]
    NativeCallFailed(Value),

    /// The engine dropped a one-shot callback without invoking it.
    #[error("native call abandoned: {0}")]
    Abandoned(&'static str),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ShieldError {
    /// Build an [`ShieldError::InvalidConfiguration`].
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The opaque engine payload, if this error carries one.
    #[must_use]
    pub fn native_payload(&self) -> Option<&Value> {
        match self {
            Self::NativeCallFailed(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Result type for Shield operations.
pub type ShieldResult<T> = Result<T, ShieldError>;
