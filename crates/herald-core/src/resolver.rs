//! Module resolution contract.
//!
//! A [`ModuleResolver`] is the environment that turns a source tree into
//! command definitions. It is used by the loader to enumerate and resolve
//! sources and by [`CommandRegistry::reload`](crate::registry::CommandRegistry::reload)
//! to re-read a single source after evicting it from the resolver's cache.

use std::path::Path;

use crate::descriptor::CommandDefinition;
use crate::error::ResolveResult;

/// Enumerates and resolves command sources.
pub trait ModuleResolver: Send + Sync + 'static {
    /// Lists the entry names directly under `path`, in a stable order.
    fn list_entries(&self, path: &Path) -> ResolveResult<Vec<String>>;

    /// Resolves the source at `path` to a definition.
    ///
    /// Resolvers may cache the result; callers that need a fresh read call
    /// [`invalidate`](Self::invalidate) first.
    fn resolve(&self, path: &Path) -> ResolveResult<CommandDefinition>;

    /// Evicts any cached resolution for `path`.
    fn invalidate(&self, path: &Path);
}
