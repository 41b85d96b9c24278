//! Unified error types for the Herald core.
//!
//! Gating rejections are not errors: the dispatch pipeline reports them as
//! values. The types here cover registry bookkeeping, definition resolution,
//! reloads, the transport and command handlers.

use std::path::PathBuf;

use thiserror::Error;

/// Boxed error used at handler and collaborator boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised when a command cannot be registered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The definition itself is malformed.
    #[error("invalid definition for command '{name}': {reason}")]
    InvalidDefinition {
        /// Name of the offending command (may be empty).
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A command with this name is already registered.
    #[error("command '{0}' is already registered")]
    DuplicateName(String),

    /// A name or alias is already claimed by another command.
    #[error("'{key}' is already used by command '{owner}'")]
    AliasCollision {
        /// The contested lookup key.
        key: String,
        /// The command currently holding it.
        owner: String,
    },

    /// The command to replace is not registered.
    #[error("command '{0}' is not registered")]
    NotRegistered(String),
}

impl RegistryError {
    /// Creates an invalid definition error.
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDefinition {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Resolve Errors
// =============================================================================

/// Errors raised by a [`ModuleResolver`](crate::resolver::ModuleResolver).
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Nothing exists at the requested location.
    #[error("no command source at {}", .0.display())]
    NotFound(PathBuf),

    /// Reading the source tree failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Location being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The source uses a format the resolver does not understand.
    #[error("unsupported command source format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    /// The source was read but does not describe a valid command.
    #[error("invalid command source {}: {reason}", path.display())]
    Manifest {
        /// Location of the source.
        path: PathBuf,
        /// Parser or validation message.
        reason: String,
    },

    /// The source names a handler that was never registered.
    #[error("command source {} refers to unknown handler '{handler}'", path.display())]
    UnknownHandler {
        /// Location of the source.
        path: PathBuf,
        /// The missing handler key.
        handler: String,
    },
}

impl ResolveError {
    /// Creates a manifest error.
    pub fn manifest(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Manifest {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Reload Errors
// =============================================================================

/// Reasons a reload can fail.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// No command matches the query.
    #[error("command '{0}' not found")]
    NotFound(String),

    /// The command was registered in code and has no source to re-read.
    #[error("command '{0}' has no source location")]
    NoSource(String),

    /// The fresh definition declares a different name.
    #[error("reloaded source renames command '{from}' to '{to}'")]
    Renamed {
        /// Name of the live command.
        from: String,
        /// Name found in the source.
        to: String,
    },

    /// Re-resolving the source failed.
    #[error(transparent)]
    Resolution(#[from] ResolveError),

    /// The fresh descriptor could not be swapped in.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl ReloadError {
    /// Returns `true` when the failure is a not-found lookup.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors reported by a [`Transport`](crate::service::Transport).
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The client is not connected.
    #[error("transport is not connected")]
    NotConnected,

    /// The platform refused or failed the send.
    #[error("failed to send message: {0}")]
    SendFailed(String),
}

// =============================================================================
// Handler Errors
// =============================================================================

/// Error returned by a command handler.
#[derive(Debug, Error)]
#[error("command handler failed: {0}")]
pub struct HandlerError(#[source] pub BoxError);

impl HandlerError {
    /// Creates a handler error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(message.into().into())
    }
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        Self(err)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for resolver operations.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for reload operations.
pub type ReloadResult<T> = Result<T, ReloadError>;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;
