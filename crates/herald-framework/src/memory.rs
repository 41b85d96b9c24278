//! In-process command sources.
//!
//! [`MemoryResolver`] maps virtual paths to factories producing
//! [`CommandDefinition`]s. It behaves like a filesystem tree for the loader
//! and caches resolutions like [`FsResolver`](crate::resolver::FsResolver),
//! which makes it the resolver of choice for embedding and tests.
//!
//! ```rust,ignore
//! let resolver = MemoryResolver::new();
//! resolver.insert("commands/utility/ping", || {
//!     CommandDefinition::new("ping", "utility", ping_handler())
//! });
//! ```

use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use herald_core::{CommandDefinition, ModuleResolver, ResolveError, ResolveResult};

type Factory = Arc<dyn Fn() -> CommandDefinition + Send + Sync>;

/// Resolver over closures registered at virtual paths.
#[derive(Default)]
pub struct MemoryResolver {
    sources: RwLock<HashMap<PathBuf, Factory>>,
    cache: RwLock<HashMap<PathBuf, CommandDefinition>>,
}

impl MemoryResolver {
    /// Creates an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces the source at `path`.
    ///
    /// A replaced source is only observed after the path is invalidated.
    pub fn insert<F>(&self, path: impl Into<PathBuf>, factory: F) -> &Self
    where
        F: Fn() -> CommandDefinition + Send + Sync + 'static,
    {
        self.sources.write().insert(path.into(), Arc::new(factory));
        self
    }

    /// Removes the source at `path`, returning whether it existed.
    pub fn remove(&self, path: &Path) -> bool {
        self.cache.write().remove(path);
        self.sources.write().remove(path).is_some()
    }

    /// Returns `true` if a resolution is cached for `path`.
    pub fn is_cached(&self, path: &Path) -> bool {
        self.cache.read().contains_key(path)
    }
}

impl ModuleResolver for MemoryResolver {
    fn list_entries(&self, path: &Path) -> ResolveResult<Vec<String>> {
        let sources = self.sources.read();
        let names: BTreeSet<String> = sources
            .keys()
            .filter_map(|key| match key.strip_prefix(path).ok()?.components().next()? {
                Component::Normal(name) => name.to_str().map(str::to_owned),
                _ => None,
            })
            .collect();

        if names.is_empty() {
            return Err(ResolveError::NotFound(path.to_path_buf()));
        }
        Ok(names.into_iter().collect())
    }

    fn resolve(&self, path: &Path) -> ResolveResult<CommandDefinition> {
        if let Some(cached) = self.cache.read().get(path) {
            return Ok(cached.clone());
        }

        let factory = self
            .sources
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(path.to_path_buf()))?;
        let definition = factory();
        self.cache
            .write()
            .insert(path.to_path_buf(), definition.clone());
        Ok(definition)
    }

    fn invalidate(&self, path: &Path) {
        self.cache.write().remove(path);
    }
}

impl std::fmt::Debug for MemoryResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryResolver")
            .field("sources", &self.sources.read().len())
            .field("cached", &self.cache.read().len())
            .finish()
    }
}
