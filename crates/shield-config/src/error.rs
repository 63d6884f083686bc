//! Configuration error types.

use shield_core::ShieldError;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read {path}: {source}")]
    ReadError {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// A config file is not valid TOML or does not match the schema.
    #[error("failed to parse {path}: {source}")]
    ParseError {
        /// Path of the file, or `<embedded defaults>`.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// An environment override holds an unusable value.
    #[error("invalid value for {var}: {message}")]
    EnvError {
        /// Environment variable name.
        var: String,
        /// What is wrong with it.
        message: String,
    },

    /// A merged value failed validation.
    #[error("invalid {field}: {message}")]
    ValidationError {
        /// Dotted field path.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl From<ShieldError> for ConfigError {
    fn from(err: ShieldError) -> Self {
        match err {
            ShieldError::InvalidConfiguration { field, message } => Self::ValidationError {
                field: format!("shield.{field}"),
                message,
            },
            other => Self::ValidationError {
                field: "shield".to_owned(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
