//! screenlink relay configuration.
//!
//! TOML-based configuration with environment overrides and validation.
//! Every section has defaults, so an empty or partial file works.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use screenlink_config::load_config;
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("listening on {}", config.server.bind_addr());
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::{apply_env_overrides, apply_port_override, PORT_ENV};
pub use schema::{
    LivenessConfig, LoggingConfig, RelayConfig, ScreenlinkConfig, ServerConfig, DEFAULT_LOG_FILTER,
};

use screenlink_common::ConfigError;
use std::path::Path;

/// Load, override, and validate the relay configuration.
///
/// Reads `path` when given (it must exist), otherwise the platform default
/// file, creating it on first run. Applies `PORT` from the environment and
/// then runs full validation.
pub fn load_config(path: Option<&Path>) -> Result<ScreenlinkConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    apply_env_overrides(&mut config)?;
    validation::validate(&config)?;
    Ok(config)
}
