//! SDK configuration handed to the engine at initialization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::InitArgs;
use crate::error::{ShieldError, ShieldResult};

/// Engine log verbosity.
///
/// The discriminants are the integer codes the engine expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "CodeOrName")]
pub enum LogLevel {
    /// No engine logging.
    #[default]
    None = 1,
    /// Informational logging.
    Info = 2,
    /// Debug logging.
    Debug = 3,
}

impl LogLevel {
    /// Integer code forwarded to the engine.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up a level by its engine code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::None),
            2 => Some(Self::Info),
            3 => Some(Self::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| {
                ShieldError::invalid_config("log_level", format!("unknown log level code {code}"))
            });
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            other => Err(ShieldError::invalid_config(
                "log_level",
                format!("unknown log level '{other}'; expected one of: none, info, debug"),
            )),
        }
    }
}

/// Deployment environment the engine reports to.
///
/// The discriminants are the integer codes the engine expects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "CodeOrName")]
pub enum Environment {
    /// Production backend.
    #[default]
    Production = 0,
    /// Development backend.
    Development = 1,
    /// Staging backend.
    Staging = 2,
}

impl Environment {
    /// Integer code forwarded to the engine.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Look up an environment by its engine code.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Production),
            1 => Some(Self::Development),
            2 => Some(Self::Staging),
            _ => None,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
        }
    }
}

impl FromStr for Environment {
    type Err = ShieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<u8>() {
            return Self::from_code(code).ok_or_else(|| {
                ShieldError::invalid_config(
                    "environment",
                    format!("unknown environment code {code}"),
                )
            });
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            "staging" | "stag" => Ok(Self::Staging),
            other => Err(ShieldError::invalid_config(
                "environment",
                format!(
                    "unknown environment '{other}'; expected one of: production, development, staging"
                ),
            )),
        }
    }
}

/// Wire form of [`LogLevel`] and [`Environment`]: the engine's integer code
/// or a name.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CodeOrName {
    /// Integer engine code.
    Code(u8),
    /// Case-insensitive name.
    Name(String),
}

impl TryFrom<CodeOrName> for LogLevel {
    type Error = ShieldError;

    fn try_from(value: CodeOrName) -> Result<Self, Self::Error> {
        match value {
            CodeOrName::Code(code) => code.to_string().parse(),
            CodeOrName::Name(name) => name.parse(),
        }
    }
}

impl TryFrom<CodeOrName> for Environment {
    type Error = ShieldError;

    fn try_from(value: CodeOrName) -> Result<Self, Self::Error> {
        match value {
            CodeOrName::Code(code) => code.to_string().parse(),
            CodeOrName::Name(name) => name.parse(),
        }
    }
}

/// Dialog the engine shows when it blocks a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDialog {
    /// Dialog title.
    pub title: String,
    /// Dialog body text.
    pub body: String,
}

impl BlockedDialog {
    /// Create a blocked-device dialog descriptor.
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Configuration passed to `initialize`.
///
/// The facade reads it once and forwards the derived positional values
/// (see [`InitArgs`]) to the engine.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShieldConfig {
    /// Site identifier issued for the application.
    #[serde(default)]
    pub site_id: String,
    /// Secret key paired with the site identifier.
    #[serde(default)]
    pub secret_key: String,
    /// Dialog shown on a blocked device; `None` disables it.
    #[serde(default)]
    pub blocked_dialog: Option<BlockedDialog>,
    /// Engine log verbosity.
    #[serde(default)]
    pub log_level: LogLevel,
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
}

impl fmt::Debug for ShieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShieldConfig")
            .field("site_id", &self.site_id)
            .field("secret_key", &"<redacted>")
            .field("blocked_dialog", &self.blocked_dialog)
            .field("log_level", &self.log_level)
            .field("environment", &self.environment)
            .finish()
    }
}

impl ShieldConfig {
    /// Create a configuration with default log level and environment.
    pub fn new(site_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            secret_key: secret_key.into(),
            blocked_dialog: None,
            log_level: LogLevel::default(),
            environment: Environment::default(),
        }
    }

    /// Set the blocked-device dialog.
    #[must_use]
    pub fn with_blocked_dialog(mut self, dialog: BlockedDialog) -> Self {
        self.blocked_dialog = Some(dialog);
        self
    }

    /// Set the engine log level.
    #[must_use]
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the deployment environment.
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Check that the identifiers are present.
    ///
    /// The engine performs the real credential validation; this only
    /// rejects values that could never be meaningful.
    ///
    /// # Errors
    ///
    /// Returns [`ShieldError::InvalidConfiguration`] naming the first empty
    /// identifier.
    pub fn validate(&self) -> ShieldResult<()> {
        if self.site_id.trim().is_empty() {
            return Err(ShieldError::invalid_config(
                "site_id",
                "site identifier must not be empty",
            ));
        }
        if self.secret_key.trim().is_empty() {
            return Err(ShieldError::invalid_config(
                "secret_key",
                "secret key must not be empty",
            ));
        }
        Ok(())
    }

    /// Derive the positional engine arguments.
    #[must_use]
    pub fn to_init_args(&self, has_callbacks: bool) -> InitArgs {
        InitArgs {
            site_id: self.site_id.clone(),
            secret_key: self.secret_key.clone(),
            has_callbacks,
            blocked_dialog: self.blocked_dialog.clone(),
            log_level: self.log_level.code(),
            environment: self.environment.code(),
        }
    }
}
