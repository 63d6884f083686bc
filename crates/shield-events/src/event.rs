//! Event types raised by the Shield engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Name of the engine's success emission.
pub const SUCCESS_EVENT: &str = "success";

/// Name of the engine's error emission.
pub const ERROR_EVENT: &str = "error";

/// Name of the engine's readiness-state emission.
pub const DEVICE_RESULT_STATE_EVENT: &str = "device_result_state";

/// Status carried by the readiness broadcast once device analysis completes.
pub const SDK_READY_STATUS: &str = "isSDKReady";

/// Metadata attached to every event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was created.
    pub timestamp: DateTime<Utc>,
    /// Component that raised the event.
    pub source: String,
}

impl EventMetadata {
    /// Create new event metadata.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
        }
    }
}

impl Default for EventMetadata {
    fn default() -> Self {
        Self::new("engine")
    }
}

/// Events the engine emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShieldEvent {
    /// The engine produced a device assessment.
    Success {
        /// Event metadata.
        metadata: EventMetadata,
        /// Opaque success payload.
        payload: Value,
    },

    /// The engine failed.
    Error {
        /// Event metadata.
        metadata: EventMetadata,
        /// Opaque error payload.
        payload: Value,
    },

    /// Readiness state changed.
    DeviceResultState {
        /// Event metadata.
        metadata: EventMetadata,
        /// Reported status, `isSDKReady` once analysis completes.
        status: String,
    },
}

impl ShieldEvent {
    /// A `success` event.
    #[must_use]
    pub fn success(payload: Value) -> Self {
        Self::Success {
            metadata: EventMetadata::default(),
            payload,
        }
    }

    /// An `error` event.
    #[must_use]
    pub fn error(payload: Value) -> Self {
        Self::Error {
            metadata: EventMetadata::default(),
            payload,
        }
    }

    /// A `device_result_state` event with the given status.
    #[must_use]
    pub fn device_result_state(status: impl Into<String>) -> Self {
        Self::DeviceResultState {
            metadata: EventMetadata::default(),
            status: status.into(),
        }
    }

    /// The readiness broadcast.
    #[must_use]
    pub fn sdk_ready() -> Self {
        Self::device_result_state(SDK_READY_STATUS)
    }

    /// Decode a named native emission.
    ///
    /// Readiness payloads may be `{"status": "..."}` or a bare status string.
    /// Returns `None` for unknown names or malformed readiness payloads.
    #[must_use]
    pub fn from_native(name: &str, payload: Value) -> Option<Self> {
        match name {
            SUCCESS_EVENT => Some(Self::success(payload)),
            ERROR_EVENT => Some(Self::error(payload)),
            DEVICE_RESULT_STATE_EVENT => {
                let status = match payload {
                    Value::String(status) => status,
                    Value::Object(mut map) => match map.remove("status") {
                        Some(Value::String(status)) => status,
                        _ => return None,
                    },
                    _ => return None,
                };
                Some(Self::device_result_state(status))
            },
            _ => None,
        }
    }

    /// The native event name.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Success { .. } => SUCCESS_EVENT,
            Self::Error { .. } => ERROR_EVENT,
            Self::DeviceResultState { .. } => DEVICE_RESULT_STATE_EVENT,
        }
    }

    /// Event metadata.
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        match self {
            Self::Success { metadata, .. }
            | Self::Error { metadata, .. }
            | Self::DeviceResultState { metadata, .. } => metadata,
        }
    }

    /// Payload of a `success` or `error` event.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } | Self::Error { payload, .. } => Some(payload),
            Self::DeviceResultState { .. } => None,
        }
    }

    /// Whether this is the readiness broadcast.
    #[must_use]
    pub fn is_sdk_ready(&self) -> bool {
        matches!(self, Self::DeviceResultState { status, .. } if status == SDK_READY_STATUS)
    }
}
