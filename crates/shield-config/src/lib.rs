#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Layered configuration for Shield sessions.
//!
//! # Usage
//!
//! ```rust,no_run
//! use shield_config::Settings;
//!
//! // defaults -> user file -> explicit file -> SHIELD_* environment
//! let settings = Settings::load(None).unwrap();
//! println!("site: {}", settings.shield.site_id);
//! ```
//!
//! # Configuration Precedence
//!
//! From highest to lowest priority:
//!
//! 1. **Environment variables** (`SHIELD_*`)
//! 2. **Explicit file** passed to [`Settings::load`]
//! 3. **User** (`<config dir>/shield/config.toml`)
//! 4. **Embedded defaults** (`defaults.toml` compiled into the binary)

/// Environment variable overrides.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use types::*;

impl Settings {
    /// Load settings with the full precedence chain.
    ///
    /// See [`loader::load`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if any source is malformed or the merged
    /// settings fail validation.
    pub fn load(explicit: Option<&std::path::Path>) -> ConfigResult<Self> {
        loader::load(explicit)
    }

    /// Parse settings from a TOML string over the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string is malformed or fails
    /// validation.
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        loader::load_str(content)
    }
}
