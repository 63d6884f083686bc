//! Test fixtures for common values.

use serde_json::{Value, json};
use shield_core::{Attributes, BlockedDialog, Environment, LogLevel, ShieldConfig};

/// Site identifier used by fixtures.
pub const TEST_SITE_ID: &str = "S1";

/// Secret key used by fixtures.
pub const TEST_SECRET_KEY: &str = "K1";

/// Minimal valid configuration with default level and environment.
#[must_use]
pub fn test_config() -> ShieldConfig {
    ShieldConfig::new(TEST_SITE_ID, TEST_SECRET_KEY)
}

/// Configuration with the info log level, as most hosts ship it.
#[must_use]
pub fn test_config_info() -> ShieldConfig {
    test_config().with_log_level(LogLevel::Info)
}

/// Fully populated configuration.
#[must_use]
pub fn test_config_full() -> ShieldConfig {
    test_config()
        .with_blocked_dialog(test_blocked_dialog())
        .with_log_level(LogLevel::Debug)
        .with_environment(Environment::Staging)
}

/// Blocked-device dialog.
#[must_use]
pub fn test_blocked_dialog() -> BlockedDialog {
    BlockedDialog::new("Device blocked", "This device cannot continue.")
}

/// Attributes for a login screen.
#[must_use]
pub fn test_attributes() -> Attributes {
    let mut attributes = Attributes::new();
    attributes.insert("userid".to_owned(), json!("u1"));
    attributes
}

/// A typical success payload.
#[must_use]
pub fn test_success_payload() -> Value {
    json!({"score": 0.9})
}

/// A typical device result payload.
#[must_use]
pub fn test_device_result() -> Value {
    json!({
        "session_id": "sess-1",
        "risk_score": 12,
        "device_intelligence": {"is_emulator": false}
    })
}
