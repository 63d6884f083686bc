//! Post-merge configuration validation.

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};
use crate::types::Settings;

/// Longest grace period accepted before the first readiness query.
pub const MAX_GRACE: Duration = Duration::from_secs(10);

/// Validate fully merged settings.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(settings: &Settings) -> ConfigResult<()> {
    settings.shield.validate()?;
    validate_readiness(settings)?;
    validate_logging(settings)?;
    Ok(())
}

fn validate_readiness(settings: &Settings) -> ConfigResult<()> {
    let r = &settings.readiness;

    if r.grace() > MAX_GRACE {
        return Err(ConfigError::ValidationError {
            field: "readiness.grace_ms".to_owned(),
            message: format!(
                "grace period of {}ms exceeds the {}ms limit",
                r.grace_ms,
                MAX_GRACE.as_millis()
            ),
        });
    }

    if r.timeout_ms == Some(0) {
        return Err(ConfigError::ValidationError {
            field: "readiness.timeout_ms".to_owned(),
            message: "timeout must be positive; unset it for an unbounded wait".to_owned(),
        });
    }

    Ok(())
}

fn validate_logging(settings: &Settings) -> ConfigResult<()> {
    let format = settings.logging.format.to_lowercase();
    if !matches!(format.as_str(), "pretty" | "compact" | "json" | "full") {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported format '{}'; expected one of: pretty, compact, json, full",
                settings.logging.format
            ),
        });
    }

    if settings.logging.level.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: "level must not be empty".to_owned(),
        });
    }

    Ok(())
}
