//! Error types for the Herald framework.

use std::path::PathBuf;

use thiserror::Error;

use herald_core::{RegistryError, ResolveError, SourceLocation};

/// Why a single command source could not be loaded.
#[derive(Debug, Error)]
pub enum EntryError {
    /// The source could not be resolved to a definition.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The definition was rejected by the registry.
    #[error(transparent)]
    Register(#[from] RegistryError),
}

/// Errors that abort a load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A directory of the command tree could not be listed.
    #[error("failed to list command directory {}: {source}", path.display())]
    Listing {
        /// The directory being listed.
        path: PathBuf,
        /// Underlying resolver error.
        #[source]
        source: ResolveError,
    },

    /// A command source failed under the fail-fast policy.
    #[error("failed to load command {location}: {source}")]
    Entry {
        /// The offending source.
        location: SourceLocation,
        /// What went wrong.
        #[source]
        source: EntryError,
    },
}

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;
