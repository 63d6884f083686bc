//! Common value types crossing the engine boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Screen attributes forwarded verbatim to the engine.
pub type Attributes = Map<String, Value>;

/// Binding name and version forwarded via `set_cross_platform_parameters`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossPlatformDescriptor {
    /// Binding name.
    pub name: String,
    /// Binding version.
    pub version: String,
}

impl CrossPlatformDescriptor {
    /// Create a descriptor.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Opaque device assessment returned by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceResult(Value);

impl DeviceResult {
    /// Wrap an engine payload.
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the payload.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Take ownership of the payload.
    #[must_use]
    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for DeviceResult {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for DeviceResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor() {
        let descriptor = CrossPlatformDescriptor::new("shield-bridge", "0.1.0");
        assert_eq!(descriptor.name, "shield-bridge");
        assert_eq!(descriptor.version, "0.1.0");
    }

    #[test]
    fn test_device_result_is_transparent() {
        let result = DeviceResult::new(json!({"risk": "low"}));
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"risk": "low"}));
        assert_eq!(result.as_value()["risk"], "low");
        assert_eq!(result.into_value(), json!({"risk": "low"}));
    }
}
