//! Config file discovery and layered loading.
//!
//! Precedence, lowest to highest:
//! 1. Embedded `defaults.toml`
//! 2. User file (`<config dir>/shield/config.toml`)
//! 3. Explicit file passed by the host
//! 4. `SHIELD_*` environment variables
//!
//! The merged tree is deserialized into [`Settings`] and validated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_overrides, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::types::Settings;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (64 KiB).
const MAX_CONFIG_FILE_SIZE: usize = 65_536;

/// Load settings using the process environment and the platform user
/// config directory.
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is malformed, an environment
/// override is unparseable, or the merged settings fail validation.
pub fn load(explicit: Option<&Path>) -> ConfigResult<Settings> {
    let user_path = user_config_path();
    load_with(explicit, user_path.as_deref(), &collect_env_vars())
}

/// Load settings from explicit sources.
///
/// `user_path` of `None` skips the user layer. Missing files at either path
/// are skipped silently.
///
/// # Errors
///
/// Same as [`load`].
pub fn load_with(
    explicit: Option<&Path>,
    user_path: Option<&Path>,
    env: &HashMap<String, String>,
) -> ConfigResult<Settings> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    for path in user_path.into_iter().chain(explicit) {
        if let Some(overlay) = try_load_file(path)? {
            deep_merge(&mut merged, &overlay);
            info!(path = %path.display(), "loaded config file");
        }
    }

    let mut settings: Settings =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    apply_env_overrides(&mut settings, env)?;
    validate::validate(&settings)?;
    debug!(settings = ?settings.shield, "settings resolved");
    Ok(settings)
}

/// Parse settings from a TOML string layered over the embedded defaults.
/// No files or environment are consulted.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the string is malformed or the result fails
/// validation.
pub fn load_str(content: &str) -> ConfigResult<Settings> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;
    let overlay: toml::Value = toml::from_str(content).map_err(|e| ConfigError::ParseError {
        path: "<string>".to_owned(),
        source: e,
    })?;
    deep_merge(&mut merged, &overlay);

    let settings: Settings =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<string>".to_owned(),
                source: e,
            })?;
    validate::validate(&settings)?;
    Ok(settings)
}

/// Platform location of the user config file, if one can be determined.
#[must_use]
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "shield")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Recursively deep-merge `overlay` into `base`.
///
/// Tables merge per key; scalars and arrays from the overlay replace.
fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Read and parse a file, returning `None` if it doesn't exist.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.display().to_string(),
                source: e,
            });
        },
    };

    if content.len() > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit",
                content.len()
            ),
        });
    }

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shield_core::{Environment, LogLevel, ReadinessPolicy};
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    fn creds() -> HashMap<String, String> {
        HashMap::from([
            ("SHIELD_SITE_ID".to_owned(), "S1".to_owned()),
            ("SHIELD_SECRET_KEY".to_owned(), "K1".to_owned()),
        ])
    }

    #[test]
    fn test_defaults_parse() {
        let val: toml::Value = toml::from_str(DEFAULTS_TOML).unwrap();
        let table = val.as_table().unwrap();
        assert!(table.contains_key("shield"));
        assert!(table.contains_key("readiness"));
        assert!(table.contains_key("logging"));
    }

    #[test]
    fn test_defaults_match_type_defaults() {
        let settings: Settings = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_env_only() {
        let settings = load_with(None, None, &creds()).unwrap();
        assert_eq!(settings.shield.site_id, "S1");
        assert_eq!(settings.shield.log_level, LogLevel::None);
        assert_eq!(settings.shield.environment, Environment::Production);
        assert_eq!(settings.readiness.policy, ReadinessPolicy::WaitForBroadcast);
        assert_eq!(settings.readiness.timeout_ms, Some(30_000));
    }

    #[test]
    fn test_missing_identifiers_rejected() {
        let err = load_with(None, None, &HashMap::new()).unwrap_err();
        assert!(
            matches!(err, ConfigError::ValidationError { ref field, .. } if field == "shield.site_id")
        );
    }

    #[test]
    fn test_layer_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let user = write_file(
            dir.path(),
            "user.toml",
            r#"
[shield]
site_id = "user-site"
secret_key = "user-key"
log_level = "debug"

[readiness]
grace_ms = 50
"#,
        );
        let explicit = write_file(
            dir.path(),
            "explicit.toml",
            r#"
[shield]
site_id = "explicit-site"
environment = 2

[shield.blocked_dialog]
title = "Blocked"
body = "Access denied"
"#,
        );
        let env = HashMap::from([("SHIELD_SECRET_KEY".to_owned(), "env-key".to_owned())]);

        let settings = load_with(Some(&explicit), Some(&user), &env).unwrap();
        assert_eq!(settings.shield.site_id, "explicit-site");
        assert_eq!(settings.shield.secret_key, "env-key");
        assert_eq!(settings.shield.log_level, LogLevel::Debug);
        assert_eq!(settings.shield.environment, Environment::Staging);
        assert_eq!(settings.readiness.grace_ms, 50);
        let dialog = settings.shield.blocked_dialog.unwrap();
        assert_eq!(dialog.title, "Blocked");
        assert_eq!(dialog.body, "Access denied");
    }

    #[test]
    fn test_missing_files_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let settings = load_with(Some(&missing), Some(&missing), &creds()).unwrap();
        assert_eq!(settings.shield.secret_key, "K1");
    }

    #[test]
    fn test_malformed_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write_file(dir.path(), "bad.toml", "[shield\nsite_id = ");
        let err = load_with(Some(&bad), None, &creds()).unwrap_err();
        match err {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("bad.toml")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let err = load_str(
            r#"
[shield]
site_id = "S1"
secret_key = "K1"
log_level = "chatty"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_str() {
        let settings = load_str(
            r#"
[shield]
site_id = "S1"
secret_key = "K1"

[readiness]
policy = "report_once"
"#,
        )
        .unwrap();
        assert_eq!(settings.readiness.policy, ReadinessPolicy::ReportOnce);
        assert_eq!(settings.readiness.grace_ms, 100);
    }

    #[test]
    fn test_deep_merge_replaces_scalars() {
        let mut base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2").unwrap();
        let overlay: toml::Value = toml::from_str("[a]\ny = 3\nz = 4").unwrap();
        deep_merge(&mut base, &overlay);
        let a = base.get("a").unwrap();
        assert_eq!(a.get("x").unwrap().as_integer(), Some(1));
        assert_eq!(a.get("y").unwrap().as_integer(), Some(3));
        assert_eq!(a.get("z").unwrap().as_integer(), Some(4));
    }
}
