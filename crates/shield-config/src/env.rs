//! Environment variable overrides.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Settings;

/// Site identifier override.
pub const ENV_SITE_ID: &str = "SHIELD_SITE_ID";
/// Secret key override.
pub const ENV_SECRET_KEY: &str = "SHIELD_SECRET_KEY";
/// Engine log level override (name or code).
pub const ENV_LOG_LEVEL: &str = "SHIELD_LOG_LEVEL";
/// Environment override (name or code).
pub const ENV_ENVIRONMENT: &str = "SHIELD_ENVIRONMENT";
/// Readiness policy override.
pub const ENV_READINESS_POLICY: &str = "SHIELD_READINESS_POLICY";
/// Readiness grace period override in milliseconds.
pub const ENV_READINESS_GRACE_MS: &str = "SHIELD_READINESS_GRACE_MS";
/// Readiness timeout override in milliseconds, or `none`.
pub const ENV_READINESS_TIMEOUT_MS: &str = "SHIELD_READINESS_TIMEOUT_MS";
/// Binding log filter override.
pub const ENV_LOG: &str = "SHIELD_LOG";

/// Snapshot the `SHIELD_*` variables of the current process.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with("SHIELD_"))
        .collect()
}

/// Apply overrides from `vars` on top of `settings`.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable holds an unparseable value.
pub fn apply_env_overrides(
    settings: &mut Settings,
    vars: &HashMap<String, String>,
) -> ConfigResult<()> {
    if let Some(v) = vars.get(ENV_SITE_ID) {
        settings.shield.site_id.clone_from(v);
        debug!(var = ENV_SITE_ID, "applied env override");
    }
    if let Some(v) = vars.get(ENV_SECRET_KEY) {
        settings.shield.secret_key.clone_from(v);
        debug!(var = ENV_SECRET_KEY, "applied env override");
    }
    if let Some(v) = vars.get(ENV_LOG_LEVEL) {
        settings.shield.log_level = v.parse().map_err(|e| env_err(ENV_LOG_LEVEL, e))?;
    }
    if let Some(v) = vars.get(ENV_ENVIRONMENT) {
        settings.shield.environment = v.parse().map_err(|e| env_err(ENV_ENVIRONMENT, e))?;
    }
    if let Some(v) = vars.get(ENV_READINESS_POLICY) {
        settings.readiness.policy = v.parse().map_err(|e| env_err(ENV_READINESS_POLICY, e))?;
    }
    if let Some(v) = vars.get(ENV_READINESS_GRACE_MS) {
        settings.readiness.grace_ms = v
            .trim()
            .parse()
            .map_err(|e| env_err(ENV_READINESS_GRACE_MS, e))?;
    }
    if let Some(v) = vars.get(ENV_READINESS_TIMEOUT_MS) {
        settings.readiness.timeout_ms = if v.trim().eq_ignore_ascii_case("none") {
            None
        } else {
            Some(
                v.trim()
                    .parse()
                    .map_err(|e| env_err(ENV_READINESS_TIMEOUT_MS, e))?,
            )
        };
    }
    if let Some(v) = vars.get(ENV_LOG) {
        settings.logging.level.clone_from(v);
    }
    Ok(())
}

fn env_err(var: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::EnvError {
        var: var.to_owned(),
        message: err.to_string(),
    }
}
