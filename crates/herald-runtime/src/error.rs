//! Runtime error types.

use thiserror::Error;

use herald_core::ReloadError;
use herald_framework::LoadError;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The command tree could not be loaded.
    #[error("Failed to load commands: {0}")]
    Load(#[from] LoadError),

    /// A command could not be reloaded.
    #[error("Failed to reload command: {0}")]
    Reload(#[from] ReloadError),

    /// A required collaborator was not supplied to the builder.
    #[error("Missing runtime component: {0}")]
    MissingComponent(&'static str),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
