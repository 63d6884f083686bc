//! Configuration struct definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shield_core::{ReadinessOptions, ShieldConfig};

/// Everything a host process needs to stand up a Shield session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine configuration forwarded at `initialize`.
    pub shield: ShieldConfig,
    /// Readiness gate tuning.
    pub readiness: ReadinessOptions,
    /// Binding-side logging.
    pub logging: LoggingSettings,
}

/// Binding-side logging settings.
///
/// These control the host's `tracing` output, not the engine's own log
/// level (see [`ShieldConfig::log_level`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter level or `EnvFilter` expression.
    pub level: String,
    /// One of `pretty`, `compact`, `json`, `full`.
    pub format: String,
    /// Extra filter directives.
    pub directives: Vec<String>,
    /// Write rotating log files here instead of stderr.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
            directory: None,
        }
    }
}
