//! Command tree loader.
//!
//! The [`Loader`] walks a two-level tree (`<root>/<group>/<entry>`) through a
//! [`ModuleResolver`] and registers every entry it finds. Names starting with
//! the exclusion marker (`_` by default) are skipped at both levels, which is
//! how drafts and shared helpers stay out of the registry.
//!
//! # Example
//!
//! ```rust,ignore
//! use herald_framework::prelude::*;
//!
//! let resolver = Arc::new(FsResolver::new(catalog));
//! let report = Loader::new(resolver).load("commands", &registry)?;
//! tracing::info!(loaded = report.loaded.len(), "ready");
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{EntryError, LoadError, LoadResult};
use herald_core::{CommandRegistry, ModuleResolver, SourceLocation};

/// What to do when one command source fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadPolicy {
    /// Abort the load on the first failure.
    #[default]
    FailFast,
    /// Skip failing sources and report them.
    CollectAndReport,
}

/// A source skipped under [`LoadPolicy::CollectAndReport`].
#[derive(Debug)]
pub struct EntryFailure {
    /// The source that failed.
    pub location: SourceLocation,
    /// Why.
    pub error: EntryError,
}

/// Summary of a load.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Names registered, in load order.
    pub loaded: Vec<String>,
    /// Sources that were skipped.
    pub failures: Vec<EntryFailure>,
}

impl LoadReport {
    /// Returns `true` if nothing failed.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Populates a registry from a command tree.
#[derive(Clone)]
pub struct Loader {
    resolver: Arc<dyn ModuleResolver>,
    exclusion_marker: String,
    policy: LoadPolicy,
}

impl Loader {
    /// Creates a fail-fast loader excluding names that start with `_`.
    pub fn new(resolver: Arc<dyn ModuleResolver>) -> Self {
        Self {
            resolver,
            exclusion_marker: "_".into(),
            policy: LoadPolicy::default(),
        }
    }

    /// Sets the exclusion marker. An empty marker excludes nothing.
    pub fn exclusion_marker(mut self, marker: impl Into<String>) -> Self {
        self.exclusion_marker = marker.into();
        self
    }

    /// Sets the failure policy.
    pub fn policy(mut self, policy: LoadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The resolver sources are read through.
    pub fn resolver(&self) -> &Arc<dyn ModuleResolver> {
        &self.resolver
    }

    fn excluded(&self, name: &str) -> bool {
        !self.exclusion_marker.is_empty() && name.starts_with(&self.exclusion_marker)
    }

    fn list(&self, dir: &Path) -> LoadResult<Vec<String>> {
        let entries = self
            .resolver
            .list_entries(dir)
            .map_err(|source| LoadError::Listing {
                path: dir.to_path_buf(),
                source,
            })?;
        Ok(entries.into_iter().filter(|n| !self.excluded(n)).collect())
    }

    /// Loads every command under `root` into `registry`.
    ///
    /// A root that cannot be listed always fails the load. Other failures
    /// follow the configured [`LoadPolicy`]; under `FailFast` commands loaded
    /// before the failure stay registered.
    pub fn load(&self, root: impl AsRef<Path>, registry: &CommandRegistry) -> LoadResult<LoadReport> {
        let root = root.as_ref();
        let mut report = LoadReport::default();

        for group in self.list(root)? {
            let group_dir = root.join(&group);
            let entries = match self.list(&group_dir) {
                Ok(entries) => entries,
                Err(LoadError::Listing { path, source }) if self.collecting() => {
                    warn!(path = %path.display(), error = %source, "Skipping unreadable group");
                    report.failures.push(EntryFailure {
                        location: SourceLocation::new(path),
                        error: source.into(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            for entry in entries {
                let location = SourceLocation::new(group_dir.join(&entry));
                match self.load_entry(&location, registry) {
                    Ok(name) => {
                        debug!(command = %name, group = %group, "Command registered");
                        report.loaded.push(name);
                    }
                    Err(error) if self.collecting() => {
                        warn!(source = %location, error = %error, "Skipping command");
                        report.failures.push(EntryFailure { location, error });
                    }
                    Err(source) => return Err(LoadError::Entry { location, source }),
                }
            }
        }

        info!(
            root = %root.display(),
            loaded = report.loaded.len(),
            failed = report.failures.len(),
            "Commands loaded"
        );
        Ok(report)
    }

    fn collecting(&self) -> bool {
        self.policy == LoadPolicy::CollectAndReport
    }

    fn load_entry(
        &self,
        location: &SourceLocation,
        registry: &CommandRegistry,
    ) -> Result<String, EntryError> {
        let definition = self.resolver.resolve(location.as_path())?;
        let name = definition.name.clone();
        registry.add((definition, location.clone()))?;
        Ok(name)
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("exclusion_marker", &self.exclusion_marker)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
