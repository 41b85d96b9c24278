//! Configuration module for the Herald runtime.
//!
//! This module provides TOML and environment based configuration loading and
//! validation for dispatch settings, the command tree and logging.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CommandsConfig, DispatchConfig, HeraldConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
